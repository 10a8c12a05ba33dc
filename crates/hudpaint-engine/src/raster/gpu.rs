use std::collections::HashMap;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::PixelRect;
use crate::surface::Bitmap;

use super::{Mesh, MeshPaint, MeshVertex, Operator, RasterParams, Rasterizer, SoftwareRasterizer};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const SOURCE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const COVERAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;
const PAINT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Initialization parameters for [`GpuRasterizer`].
#[derive(Debug, Clone)]
pub struct GpuRasterizerInit {
    /// Adapter preference. Low power is usually enough for overlay drawing.
    pub power_preference: wgpu::PowerPreference,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Debug label prefix for wgpu objects.
    pub label: Option<String>,
}

impl Default for GpuRasterizerInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::LowPower,
            required_limits: wgpu::Limits::downlevel_defaults(),
            label: None,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ParamsUniform {
    viewport: [f32; 2],
    paint_offset: [f32; 2],
    use_paint: u32,
    _pad: [u32; 3],
}

/// wgpu-backed rasterizer.
///
/// Each draw uploads the target region, renders the mesh in two passes
/// (coverage, then operator composite) and reads the region back. Readback
/// blocks on the device queue.
///
/// Limitations:
/// - antialiasing is not applied; coverage is one sample per pixel
/// - `Multiply` is exact only over an opaque destination
/// - regions beyond the device's texture or buffer limits are drawn by the
///   software rasterizer instead
pub struct GpuRasterizer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    label: String,

    shader: wgpu::ShaderModule,
    params_bgl: wgpu::BindGroupLayout,
    textures_bgl: wgpu::BindGroupLayout,
    mesh_pipeline: wgpu::RenderPipeline,
    composite_layout: wgpu::PipelineLayout,
    composite_pipelines: HashMap<Operator, wgpu::RenderPipeline>,

    fallback: SoftwareRasterizer,
    warned_antialias: bool,
}

impl GpuRasterizer {
    /// Blocking constructor; see [`new_async`](Self::new_async).
    pub fn new(init: GpuRasterizerInit) -> Result<Self> {
        pollster::block_on(Self::new_async(init))
    }

    /// Acquires an adapter and device without a presentation surface.
    pub async fn new_async(init: GpuRasterizerInit) -> Result<Self> {
        let label = init.label.unwrap_or_else(|| "hudpaint".to_string());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        log::info!(
            "GpuRasterizer: using adapter {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(&format!("{label} device")),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} mesh shader")),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} params bgl")),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ParamsUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let textures_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} textures bgl")),
            entries: &[texture_entry(0), texture_entry(1), texture_entry(2)],
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} mesh pipeline layout")),
            bind_group_layouts: &[&params_bgl],
            immediate_size: 0,
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} composite pipeline layout")),
            bind_group_layouts: &[&params_bgl, &textures_bgl],
            immediate_size: 0,
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{label} mesh pipeline")),
            layout: Some(&mesh_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
                compilation_options: Default::default(),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: SOURCE_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: COVERAGE_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
            }),
            primitive: triangle_list(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            adapter_info,
            label,
            shader,
            params_bgl,
            textures_bgl,
            mesh_pipeline,
            composite_layout,
            composite_pipelines: HashMap::new(),
            fallback: SoftwareRasterizer::new(),
            warned_antialias: false,
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    fn ensure_composite_pipeline(&mut self, op: Operator) {
        let Self { device, shader, composite_layout, label, composite_pipelines, .. } = self;
        composite_pipelines.entry(op).or_insert_with(|| {
            log::debug!("GpuRasterizer: building composite pipeline for {op:?}");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{label} composite {op:?}")),
                layout: Some(composite_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_region"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_composite"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: Some(operator_blend(op)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: triangle_list(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        });
    }

    fn try_draw(
        &mut self,
        target: &mut Bitmap,
        region: PixelRect,
        mesh: &Mesh,
        paint: &MeshPaint,
        params: &RasterParams,
    ) -> Result<()> {
        let (w, h) = (region.width, region.height);
        let extent = wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 };
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        // ── resources ─────────────────────────────────────────────────────
        let dst = self.region_texture(extent, TARGET_FORMAT, "destination");
        self.queue.write_texture(
            dst.as_image_copy(),
            &target.read_region_premul_rgba8(region),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w * 4),
                rows_per_image: Some(h),
            },
            extent,
        );
        let src = self.region_texture(extent, SOURCE_FORMAT, "source");
        let cov = self.region_texture(extent, COVERAGE_FORMAT, "coverage");

        let (paint_tex, uniform) = match paint {
            MeshPaint::VertexColor => (self.paint_texture(1, 1, &[[0.0; 4]]), ParamsUniform {
                viewport: [w as f32, h as f32],
                paint_offset: [0.0; 2],
                use_paint: 0,
                _pad: [0; 3],
            }),
            MeshPaint::Texture { image, origin } => (
                self.paint_texture(image.width(), image.height(), image.texels()),
                ParamsUniform {
                    viewport: [w as f32, h as f32],
                    paint_offset: [
                        (region.x as i64 - origin.0 as i64) as f32,
                        (region.y as i64 - origin.1 as i64) as f32,
                    ],
                    use_paint: 1,
                    _pad: [0; 3],
                },
            ),
        };

        let ubo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} params ubo", self.label)),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let vbo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} mesh vbo", self.label)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} mesh ibo", self.label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let params_bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} params bind group", self.label)),
            layout: &self.params_bgl,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() }],
        });

        let view = |t: &wgpu::Texture| t.create_view(&wgpu::TextureViewDescriptor::default());
        let (dst_view, src_view, cov_view, paint_view) =
            (view(&dst), view(&src), view(&cov), view(&paint_tex));

        let textures_bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} textures bind group", self.label)),
            layout: &self.textures_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&paint_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&cov_view),
                },
            ],
        });

        let padded_row = align_to(w * 4, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} readback", self.label)),
            size: padded_row as u64 * h as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── passes ────────────────────────────────────────────────────────
        self.ensure_composite_pipeline(params.operator);
        let composite = self
            .composite_pipelines
            .get(&params.operator)
            .context("composite pipeline missing after creation")?;

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(&format!("{} draw encoder", self.label)),
        });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!("{} mesh pass", self.label)),
                color_attachments: &[
                    Some(clear_attachment(&src_view)),
                    Some(clear_attachment(&cov_view)),
                ],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_pipeline(&self.mesh_pipeline);
            rpass.set_bind_group(0, &params_bg, &[]);
            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.indices.len() as u32, 0, 0..1);
        }

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!("{} composite pass", self.label)),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_pipeline(composite);
            rpass.set_bind_group(0, &params_bg, &[]);
            rpass.set_bind_group(1, &textures_bg, &[]);
            rpass.draw(0..3, 0..1);
        }

        encoder.copy_texture_to_buffer(
            dst.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(h),
                },
            },
            extent,
        );
        self.queue.submit(Some(encoder.finish()));
        if let Some(err) = pollster::block_on(scope.pop()) {
            anyhow::bail!("device rejected the draw: {err}");
        }

        // ── readback ──────────────────────────────────────────────────────
        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("wgpu poll failed")?;
        rx.recv()
            .context("readback channel closed")?
            .context("readback map failed")?;

        let mapped = slice.get_mapped_range();
        let row_bytes = w as usize * 4;
        let mut out = Vec::with_capacity(row_bytes * h as usize);
        for row in 0..h as usize {
            let start = row * padded_row as usize;
            out.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        readback.unmap();

        target.write_region_premul_rgba8(region, &out);
        Ok(())
    }

    fn region_texture(
        &self,
        extent: wgpu::Extent3d,
        format: wgpu::TextureFormat,
        what: &str,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{} {what} texture", self.label)),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn paint_texture(&self, width: u32, height: u32, texels: &[[f32; 4]]) -> wgpu::Texture {
        let extent = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{} paint texture", self.label)),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PAINT_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            texture.as_image_copy(),
            bytemuck::cast_slice(texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 16),
                rows_per_image: Some(height),
            },
            extent,
        );
        texture
    }
}

impl Rasterizer for GpuRasterizer {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn draw_mesh(
        &mut self,
        target: &mut Bitmap,
        region: PixelRect,
        mesh: &Mesh,
        paint: &MeshPaint,
        params: &RasterParams,
    ) {
        if mesh.is_empty() {
            return;
        }
        let Some(clipped) = region.intersect(target.bounds()) else {
            return;
        };
        let shifted;
        let mesh = if clipped == region {
            mesh
        } else {
            let dx = (clipped.x as i64 - region.x as i64) as f32;
            let dy = (clipped.y as i64 - region.y as i64) as f32;
            let mut m = mesh.clone();
            for v in &mut m.vertices {
                v.pos = [v.pos[0] - dx, v.pos[1] - dy];
            }
            shifted = m;
            &shifted
        };
        let region = clipped;
        let limits = self.device.limits();
        let paint_fits = match paint {
            MeshPaint::VertexColor => true,
            MeshPaint::Texture { image, .. } => region_fits(&limits, image.width(), image.height()),
        };
        if !(paint_fits && region_fits(&limits, region.width, region.height)) {
            log::debug!(
                "GpuRasterizer: {}x{} region exceeds device limits, drawing in software",
                region.width,
                region.height
            );
            self.fallback.draw_mesh(target, region, mesh, paint, params);
            return;
        }
        if params.antialias && !self.warned_antialias {
            log::warn!("GpuRasterizer: antialiasing is not supported; drawing aliased");
            self.warned_antialias = true;
        }
        if let Err(err) = self.try_draw(target, region, mesh, paint, params) {
            log::warn!("GpuRasterizer: draw failed: {err:#}");
        }
    }
}

fn triangle_list() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

fn clear_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    }
}

/// Fixed-function blend equivalent of `op` on premultiplied color.
fn operator_blend(op: Operator) -> wgpu::BlendState {
    use wgpu::BlendFactor as F;

    let pd = |src: F, dst: F| {
        let c = wgpu::BlendComponent {
            src_factor: src,
            dst_factor: dst,
            operation: wgpu::BlendOperation::Add,
        };
        wgpu::BlendState { color: c, alpha: c }
    };
    let over_alpha = wgpu::BlendComponent {
        src_factor: F::One,
        dst_factor: F::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };

    match op {
        Operator::Clear => pd(F::Zero, F::Zero),
        Operator::Source => pd(F::One, F::Zero),
        Operator::Over => pd(F::One, F::OneMinusSrcAlpha),
        Operator::In => pd(F::DstAlpha, F::Zero),
        Operator::Out => pd(F::OneMinusDstAlpha, F::Zero),
        Operator::Atop => pd(F::DstAlpha, F::OneMinusSrcAlpha),
        Operator::Dest => pd(F::Zero, F::One),
        Operator::DestOver => pd(F::OneMinusDstAlpha, F::One),
        Operator::DestIn => pd(F::Zero, F::SrcAlpha),
        Operator::DestOut => pd(F::Zero, F::OneMinusSrcAlpha),
        Operator::DestAtop => pd(F::OneMinusDstAlpha, F::SrcAlpha),
        Operator::Xor => pd(F::OneMinusDstAlpha, F::OneMinusSrcAlpha),
        Operator::Add => pd(F::One, F::One),
        Operator::Multiply => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: F::Dst,
                dst_factor: F::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: over_alpha,
        },
        Operator::Screen => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: F::One,
                dst_factor: F::OneMinusSrc,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: over_alpha,
        },
    }
}

/// Whether a `width`×`height` draw stays within `limits`: every region
/// texture side and the padded readback buffer.
fn region_fits(limits: &wgpu::Limits, width: u32, height: u32) -> bool {
    let max = limits.max_texture_dimension_2d;
    if width == 0 || height == 0 || width > max || height > max {
        return false;
    }
    // Rgba32Float paint texels are the widest rows uploaded.
    let Some(row) = width.checked_mul(16) else {
        return false;
    };
    let padded = align_to(row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) as u64;
    padded * height as u64 <= limits.max_buffer_size
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}
