use crate::paint::Pattern;
use crate::surface::{Content, Surface};

use super::DrawingContext;

/// One open group: the surface drawing returns to on pop, and the depth of
/// the save stack that belongs to the enclosing scope.
#[derive(Debug)]
pub struct GroupFrame {
    pub(super) parent: Surface,
    pub(super) saved_depth: usize,
}

impl DrawingContext {
    /// Redirects drawing into a new transparent surface the size of the
    /// current target.
    pub fn push_group(&mut self) {
        self.push_group_with_content(Content::ColorAlpha);
    }

    /// Like [`push_group`](Self::push_group); `content` decides which channels
    /// survive when the group is popped.
    ///
    /// The current attributes are saved and restored by the matching pop. The
    /// transform, clip and path carry over into the group unchanged, so group
    /// pixels line up with the target's.
    pub fn push_group_with_content(&mut self, content: Content) {
        let child = Surface::with_content(
            self.target.width() as i32,
            self.target.height() as i32,
            content,
        );
        self.save();
        let parent = std::mem::replace(&mut self.target, child);
        self.groups.push(GroupFrame {
            parent,
            saved_depth: self.saved.len(),
        });
        log::debug!(
            "context: pushed group {} ({content:?}), depth {}",
            self.target.id(),
            self.groups.len()
        );
    }

    /// Ends the innermost group and returns its pixels as a surface pattern.
    ///
    /// The pattern is aligned so that painting it under the restored transform
    /// reproduces the group in place. Returns `None` when no group is open.
    pub fn pop_group(&mut self) -> Option<Pattern> {
        let Some(frame) = self.groups.pop() else {
            log::debug!("context: pop_group without matching push ignored");
            return None;
        };
        let child = std::mem::replace(&mut self.target, frame.parent);

        // Unbalanced saves made inside the group end with it.
        self.saved.truncate(frame.saved_depth);
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }

        let content = child.content();
        child.with_bitmap_mut(|bitmap| bitmap.restrict_to(content));
        log::debug!(
            "context: popped group {}, depth {}",
            child.id(),
            self.groups.len()
        );

        let mut pattern = Pattern::for_surface(&child);
        pattern.set_matrix(self.state.matrix);
        Some(pattern)
    }

    /// Ends the innermost group and installs it as the source.
    pub fn pop_group_to_source(&mut self) {
        if let Some(pattern) = self.pop_group() {
            self.set_source(pattern);
        }
    }

    /// Number of open groups.
    #[inline]
    pub fn group_depth(&self) -> usize {
        self.groups.len()
    }
}
