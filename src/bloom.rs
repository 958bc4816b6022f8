//! Bloom post-processing: bright pass at half resolution, separable blur,
//! then composite of scene + glow into the presentation surface.
//!
//! The composer owns the HDR scene target the particle pass draws into, so
//! resizing it resizes every intermediate texture in one place.

use crate::theme::BloomSettings;

/// Format of the scene and bloom intermediates
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BloomUniforms {
    texel_size: [f32; 2],
    direction: [f32; 2],
    threshold: f32,
    strength: f32,
    radius: f32,
    _padding: f32,
}

struct Target {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Size-dependent resources, rebuilt on resize
struct Targets {
    scene: Target,
    bright: Target,
    blurred: Target,
    threshold_group: wgpu::BindGroup,
    blur_h_group: wgpu::BindGroup,
    blur_v_group: wgpu::BindGroup,
    composite_group: wgpu::BindGroup,
}

pub struct BloomComposer {
    threshold_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    // composite/threshold, horizontal blur, vertical blur
    params_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,
    targets: Targets,
    settings: BloomSettings,
    width: u32,
    height: u32,
}

impl BloomComposer {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Bind Group Layout"),
            entries: &[
                // Source texture
                texture_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Blurred glow, only read by the composite
                texture_entry(3),
            ],
        });

        let uniform_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<BloomUniforms>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let params_buffer = uniform_buffer("Bloom Params Buffer");
        let blur_h_buffer = uniform_buffer("Bloom Horizontal Blur Buffer");
        let blur_v_buffer = uniform_buffer("Bloom Vertical Blur Buffer");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/bloom.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let threshold_pipeline =
            create_pipeline(device, &layout, &shader, "fs_threshold", HDR_FORMAT);
        let blur_pipeline = create_pipeline(device, &layout, &shader, "fs_blur", HDR_FORMAT);
        let composite_pipeline =
            create_pipeline(device, &layout, &shader, "fs_composite", output_format);

        let targets = Targets::new(
            device,
            &bind_group_layout,
            &sampler,
            [&params_buffer, &blur_h_buffer, &blur_v_buffer],
            width,
            height,
        );

        Self {
            threshold_pipeline,
            blur_pipeline,
            composite_pipeline,
            bind_group_layout,
            sampler,
            params_buffer,
            blur_h_buffer,
            blur_v_buffer,
            targets,
            settings: BloomSettings::default(),
            width,
            height,
        }
    }

    /// View the particle pass renders into
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_settings(&mut self, queue: &wgpu::Queue, settings: BloomSettings) {
        self.settings = settings;
        self.write_uniforms(queue);
    }

    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        let Some((width, height)) = resized_extent((self.width, self.height), (width, height)) else {
            return;
        };
        self.width = width;
        self.height = height;
        self.targets = Targets::new(
            device,
            &self.bind_group_layout,
            &self.sampler,
            [&self.params_buffer, &self.blur_h_buffer, &self.blur_v_buffer],
            width,
            height,
        );
        self.write_uniforms(queue);
    }

    fn write_uniforms(&self, queue: &wgpu::Queue) {
        let (half_w, half_h) = half_size(self.width, self.height);
        let base = BloomUniforms {
            texel_size: [1.0 / half_w as f32, 1.0 / half_h as f32],
            direction: [0.0, 0.0],
            threshold: self.settings.threshold,
            strength: self.settings.strength,
            radius: self.settings.radius,
            _padding: 0.0,
        };
        let horizontal = BloomUniforms {
            direction: [1.0, 0.0],
            ..base
        };
        let vertical = BloomUniforms {
            direction: [0.0, 1.0],
            ..base
        };

        queue.write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[base]));
        queue.write_buffer(&self.blur_h_buffer, 0, bytemuck::cast_slice(&[horizontal]));
        queue.write_buffer(&self.blur_v_buffer, 0, bytemuck::cast_slice(&[vertical]));
    }

    /// Record bright pass, blur and composite into `output`
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let t = &self.targets;
        let passes = [
            ("Bloom Threshold Pass", &t.bright.view, &self.threshold_pipeline, &t.threshold_group),
            ("Bloom Blur H Pass", &t.blurred.view, &self.blur_pipeline, &t.blur_h_group),
            ("Bloom Blur V Pass", &t.bright.view, &self.blur_pipeline, &t.blur_v_group),
            ("Bloom Composite Pass", output, &self.composite_pipeline, &t.composite_group),
        ];
        for (label, target, pipeline, bind_group) in passes {
            fullscreen_pass(encoder, label, target, pipeline, bind_group);
        }
    }
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        [params, blur_h, blur_v]: [&wgpu::Buffer; 3],
        width: u32,
        height: u32,
    ) -> Self {
        let (half_w, half_h) = half_size(width, height);
        let scene = Target::new(device, "Scene HDR Target", width, height);
        let bright = Target::new(device, "Bloom Bright Target", half_w, half_h);
        let blurred = Target::new(device, "Bloom Blur Target", half_w, half_h);

        let group = |label: &str,
                     source: &wgpu::TextureView,
                     uniforms: &wgpu::Buffer,
                     glow: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(glow),
                    },
                ],
            })
        };

        // Binding 3 is unused outside the composite; any sampleable view satisfies it
        let threshold_group = group("Bloom Threshold Group", &scene.view, params, &blurred.view);
        let blur_h_group = group("Bloom Blur H Group", &bright.view, blur_h, &bright.view);
        let blur_v_group = group("Bloom Blur V Group", &blurred.view, blur_v, &blurred.view);
        let composite_group = group("Bloom Composite Group", &scene.view, params, &bright.view);

        Self {
            scene,
            bright,
            blurred,
            threshold_group,
            blur_h_group,
            blur_v_group,
            composite_group,
        }
    }
}

/// Dimensions of the half-resolution bloom chain
/// New target extent for a resize request; `None` when nothing needs rebuilding
pub fn resized_extent(current: (u32, u32), requested: (u32, u32)) -> Option<(u32, u32)> {
    match requested {
        (0, _) | (_, 0) => None,
        size if size == current => None,
        size => Some(size),
    }
}

pub fn half_size(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
