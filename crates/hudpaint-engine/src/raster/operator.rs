/// Porter-Duff and separable blend operators.
///
/// All arithmetic is on premultiplied RGBA.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Operator {
    Clear,
    Source,
    #[default]
    Over,
    In,
    Out,
    Atop,
    Dest,
    DestOver,
    DestIn,
    DestOut,
    DestAtop,
    Xor,
    Add,
    Multiply,
    Screen,
}

impl Operator {
    pub const ALL: [Operator; 15] = [
        Operator::Clear,
        Operator::Source,
        Operator::Over,
        Operator::In,
        Operator::Out,
        Operator::Atop,
        Operator::Dest,
        Operator::DestOver,
        Operator::DestIn,
        Operator::DestOut,
        Operator::DestAtop,
        Operator::Xor,
        Operator::Add,
        Operator::Multiply,
        Operator::Screen,
    ];

    /// Full-coverage result of compositing `src` onto `dst`.
    pub fn blend(self, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
        let sa = src[3];
        let da = dst[3];
        // Porter-Duff: result = src * fa + dst * fb.
        let pd = |fa: f32, fb: f32| -> [f32; 4] {
            [
                src[0] * fa + dst[0] * fb,
                src[1] * fa + dst[1] * fb,
                src[2] * fa + dst[2] * fb,
                src[3] * fa + dst[3] * fb,
            ]
        };
        match self {
            Operator::Clear => [0.0; 4],
            Operator::Source => src,
            Operator::Over => pd(1.0, 1.0 - sa),
            Operator::In => pd(da, 0.0),
            Operator::Out => pd(1.0 - da, 0.0),
            Operator::Atop => pd(da, 1.0 - sa),
            Operator::Dest => dst,
            Operator::DestOver => pd(1.0 - da, 1.0),
            Operator::DestIn => pd(0.0, sa),
            Operator::DestOut => pd(0.0, 1.0 - sa),
            Operator::DestAtop => pd(1.0 - da, sa),
            Operator::Xor => pd(1.0 - da, 1.0 - sa),
            Operator::Add => {
                let s = pd(1.0, 1.0);
                s.map(|c| c.min(1.0))
            }
            Operator::Multiply => {
                let a = sa + da - sa * da;
                let ch = |i: usize| src[i] * dst[i] + src[i] * (1.0 - da) + dst[i] * (1.0 - sa);
                [ch(0), ch(1), ch(2), a]
            }
            Operator::Screen => {
                let a = sa + da - sa * da;
                let ch = |i: usize| src[i] + dst[i] - src[i] * dst[i];
                [ch(0), ch(1), ch(2), a]
            }
        }
    }

    /// Composites with partial `coverage` in `[0, 1]`: the destination moves
    /// towards the full-coverage result in proportion to coverage.
    #[inline]
    pub fn composite(self, src: [f32; 4], dst: [f32; 4], coverage: f32) -> [f32; 4] {
        let full = self.blend(src, dst);
        let cov = coverage.clamp(0.0, 1.0);
        let mut out = [0.0; 4];
        for i in 0..4 {
            out[i] = (dst[i] + (full[i] - dst[i]) * cov).clamp(0.0, 1.0);
        }
        // Keep premultiplied color within alpha.
        for i in 0..3 {
            out[i] = out[i].min(out[3]);
        }
        out
    }

    /// True when the operator reads nothing from the source.
    #[inline]
    pub fn ignores_source(self) -> bool {
        matches!(self, Operator::Clear | Operator::Dest)
    }
}
