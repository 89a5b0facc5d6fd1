#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use formats::SphereConfig;
    use gpu::{
        EyeUniforms, InstanceUniforms, MeshKind, RenderCommand, RenderFrame, RenderPlan,
        SphereVertex, inverted_sphere_mesh,
    };
    use std::borrow::Cow;
    use std::collections::HashMap;
    use tracing::{debug, warn};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::ImageBitmap;

    const MAX_EYES: u64 = 2;

    const PANORAMA_SHADER: &str = r#"
struct Eye {
    view_proj: mat4x4<f32>,
};

struct Instance {
    model: mat4x4<f32>,
    color: vec4<f32>,
    textured: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> eye: Eye;

@group(1) @binding(0)
var<uniform> instance: Instance;

@group(2) @binding(0)
var image: texture_2d<f32>;
@group(2) @binding(1)
var image_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    return VsOut(eye.view_proj * instance.model * vec4<f32>(position, 1.0), uv);
}

@fragment
fn fs_main(frag: VsOut) -> @location(0) vec4<f32> {
    let sampled = textureSample(image, image_sampler, frag.uv);
    let flat = instance.color;
    let textured = vec4<f32>(sampled.rgb * flat.rgb, sampled.a * flat.a);
    return mix(flat, textured, instance.textured);
}
"#;

    #[derive(Debug)]
    struct Mesh {
        vertices: ::wgpu::Buffer,
        indices: ::wgpu::Buffer,
        index_count: u32,
    }

    /// A sampled texture and the bind group that exposes it to the shader.
    #[derive(Debug)]
    pub struct BoundTexture {
        _texture: ::wgpu::Texture,
        bind_group: ::wgpu::BindGroup,
    }

    #[derive(Debug)]
    pub struct Renderer {
        _instance: &'static ::wgpu::Instance,
        surface: ::wgpu::Surface<'static>,
        device: ::wgpu::Device,
        queue: ::wgpu::Queue,
        config: ::wgpu::SurfaceConfiguration,
        _canvas: web_sys::HtmlCanvasElement,
        pipeline: ::wgpu::RenderPipeline,
        eye_buffer: ::wgpu::Buffer,
        eye_bind_group: ::wgpu::BindGroup,
        instance_layout: ::wgpu::BindGroupLayout,
        instance_buffer: ::wgpu::Buffer,
        instance_bind_group: ::wgpu::BindGroup,
        instance_capacity: u64,
        uniform_stride: u64,
        texture_layout: ::wgpu::BindGroupLayout,
        sampler: ::wgpu::Sampler,
        panorama_mesh: Mesh,
        marker_sphere: Mesh,
        quad: Mesh,
        blank: BoundTexture,
        panorama: Option<(String, BoundTexture)>,
        icons: HashMap<String, BoundTexture>,
        device_pixel_ratio: f64,
    }

    fn align_to(size: u64, alignment: u64) -> u64 {
        size.div_ceil(alignment) * alignment
    }

    fn upload_mesh(device: &::wgpu::Device, label: &str, vertices: &[SphereVertex], indices: &[u32]) -> Mesh {
        Mesh {
            vertices: device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: ::wgpu::BufferUsages::VERTEX,
            }),
            indices: device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: ::wgpu::BufferUsages::INDEX,
            }),
            index_count: indices.len() as u32,
        }
    }

    /// Unit quad in the XY plane, facing +Z.
    fn quad_mesh() -> (Vec<SphereVertex>, Vec<u32>) {
        let v = |x: f32, y: f32, u: f32, w: f32| SphereVertex {
            position: [x, y, 0.0],
            uv: [u, w],
        };
        (
            vec![
                v(-0.5, 0.5, 0.0, 0.0),
                v(0.5, 0.5, 1.0, 0.0),
                v(0.5, -0.5, 1.0, 1.0),
                v(-0.5, -0.5, 0.0, 1.0),
            ],
            vec![0, 3, 2, 0, 2, 1],
        )
    }

    fn uniform_layout(device: &::wgpu::Device, label: &str, size: u64) -> ::wgpu::BindGroupLayout {
        device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[::wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: ::wgpu::BindingType::Buffer {
                    ty: ::wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: ::wgpu::BufferSize::new(size),
                },
                count: None,
            }],
        })
    }

    fn uniform_bind_group(
        device: &::wgpu::Device,
        label: &str,
        layout: &::wgpu::BindGroupLayout,
        buffer: &::wgpu::Buffer,
        size: u64,
    ) -> ::wgpu::BindGroup {
        device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: ::wgpu::BindingResource::Buffer(::wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: ::wgpu::BufferSize::new(size),
                }),
            }],
        })
    }

    fn uniform_buffer(device: &::wgpu::Device, label: &str, size: u64) -> ::wgpu::Buffer {
        device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub async fn init_renderer(
        canvas_id: &str,
        sphere: &SphereConfig,
        device_pixel_ratio: f64,
    ) -> Result<Renderer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas_elem = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas missing"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let width = canvas_elem.width().max(1);
        let height = canvas_elem.height().max(1);

        // The surface must not outlive its instance; the instance lives for
        // the lifetime of the page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas_elem.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        // Panorama photos need the adapter's full texture size.
        let limits = ::wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("panorama-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: limits,
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| JsValue::from_str("surface has no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("panorama-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(PANORAMA_SHADER)),
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let eye_size = std::mem::size_of::<EyeUniforms>() as u64;
        let instance_size = std::mem::size_of::<InstanceUniforms>() as u64;
        let uniform_stride = align_to(eye_size.max(instance_size), alignment);

        let eye_layout = uniform_layout(&device, "panorama-eye-bgl", eye_size);
        let eye_buffer = uniform_buffer(&device, "panorama-eye", uniform_stride * MAX_EYES);
        let eye_bind_group =
            uniform_bind_group(&device, "panorama-eye-bg", &eye_layout, &eye_buffer, eye_size);

        let instance_layout = uniform_layout(&device, "panorama-instance-bgl", instance_size);
        let instance_capacity = 32;
        let instance_buffer =
            uniform_buffer(&device, "panorama-instances", uniform_stride * instance_capacity);
        let instance_bind_group = uniform_bind_group(
            &device,
            "panorama-instance-bg",
            &instance_layout,
            &instance_buffer,
            instance_size,
        );

        let texture_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("panorama-texture-bgl"),
            entries: &[
                ::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Texture {
                        sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: ::wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                ::wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some("panorama-sampler"),
            address_mode_u: ::wgpu::AddressMode::ClampToEdge,
            address_mode_v: ::wgpu::AddressMode::ClampToEdge,
            mag_filter: ::wgpu::FilterMode::Linear,
            min_filter: ::wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("panorama-pipeline-layout"),
            bind_group_layouts: &[&eye_layout, &instance_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("panorama-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SphereVertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x2,
                            offset: 12,
                            shader_location: 1,
                        },
                    ],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                // The panorama is seen from inside and markers from any side.
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Draw order is the scene order: sphere first, then markers.
            depth_stencil: None,
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let panorama = inverted_sphere_mesh(
            sphere.radius as f32,
            sphere.width_segments,
            sphere.height_segments,
        );
        let panorama_mesh = upload_mesh(&device, "panorama-sphere", &panorama.vertices, &panorama.indices);
        let body = inverted_sphere_mesh(1.0, 16, 12);
        let marker_sphere = upload_mesh(&device, "marker-sphere", &body.vertices, &body.indices);
        let (quad_vertices, quad_indices) = quad_mesh();
        let quad = upload_mesh(&device, "marker-quad", &quad_vertices, &quad_indices);

        let blank = blank_texture(&device, &queue, &texture_layout, &sampler);

        debug!(width, height, ?format, "renderer ready");
        Ok(Renderer {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            _canvas: canvas_elem,
            pipeline,
            eye_buffer,
            eye_bind_group,
            instance_layout,
            instance_buffer,
            instance_bind_group,
            instance_capacity,
            uniform_stride,
            texture_layout,
            sampler,
            panorama_mesh,
            marker_sphere,
            quad,
            blank,
            panorama: None,
            icons: HashMap::new(),
            device_pixel_ratio,
        })
    }

    fn bind_texture(
        device: &::wgpu::Device,
        layout: &::wgpu::BindGroupLayout,
        sampler: &::wgpu::Sampler,
        texture: ::wgpu::Texture,
    ) -> BoundTexture {
        let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("panorama-texture-bg"),
            layout,
            entries: &[
                ::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ::wgpu::BindingResource::TextureView(&view),
                },
                ::wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ::wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        BoundTexture {
            _texture: texture,
            bind_group,
        }
    }

    /// 1x1 white texture bound for flat-coloured draws.
    fn blank_texture(
        device: &::wgpu::Device,
        queue: &::wgpu::Queue,
        layout: &::wgpu::BindGroupLayout,
        sampler: &::wgpu::Sampler,
    ) -> BoundTexture {
        let size = ::wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("blank-texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            ::wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: ::wgpu::Origin3d::ZERO,
                aspect: ::wgpu::TextureAspect::All,
            },
            &[255, 255, 255, 255],
            ::wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );
        bind_texture(device, layout, sampler, texture)
    }

    impl Renderer {
        fn upload_bitmap(&self, label: &str, bitmap: &ImageBitmap) -> Result<BoundTexture, String> {
            let max = self.device.limits().max_texture_dimension_2d;
            let (width, height) = (bitmap.width(), bitmap.height());
            if width == 0 || height == 0 || width > max || height > max {
                return Err(format!("{label}: {width}x{height} exceeds texture limit {max}"));
            }
            let size = ::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            };
            let texture = self.device.create_texture(&::wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: ::wgpu::TextureDimension::D2,
                format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: ::wgpu::TextureUsages::TEXTURE_BINDING
                    | ::wgpu::TextureUsages::COPY_DST
                    | ::wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            self.queue.copy_external_image_to_texture(
                &::wgpu::CopyExternalImageSourceInfo {
                    source: ::wgpu::ExternalImageSource::ImageBitmap(bitmap.clone()),
                    origin: ::wgpu::Origin2d::ZERO,
                    flip_y: false,
                },
                ::wgpu::CopyExternalImageDestInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: ::wgpu::Origin3d::ZERO,
                    aspect: ::wgpu::TextureAspect::All,
                    color_space: ::wgpu::PredefinedColorSpace::Srgb,
                    premultiplied_alpha: false,
                },
                size,
            );
            Ok(bind_texture(&self.device, &self.texture_layout, &self.sampler, texture))
        }

        pub fn panorama_url(&self) -> Option<&str> {
            self.panorama.as_ref().map(|(url, _)| url.as_str())
        }

        /// Replaces the panorama texture; the previous one is dropped.
        pub fn set_panorama(&mut self, url: &str, bitmap: &ImageBitmap) {
            match self.upload_bitmap(url, bitmap) {
                Ok(texture) => self.panorama = Some((url.to_string(), texture)),
                Err(err) => {
                    warn!(%err, "panorama upload failed");
                    self.panorama = None;
                }
            }
        }

        pub fn has_icon(&self, path: &str) -> bool {
            self.icons.contains_key(path)
        }

        pub fn insert_icon(&mut self, path: &str, bitmap: &ImageBitmap) {
            match self.upload_bitmap(path, bitmap) {
                Ok(texture) => {
                    self.icons.insert(path.to_string(), texture);
                }
                Err(err) => warn!(%err, "icon upload failed"),
            }
        }

        /// Drops every texture. The shared icon bitmaps stay cached on the CPU side.
        pub fn release_textures(&mut self) {
            self.panorama = None;
            self.icons.clear();
        }

        pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
            self.config.width = width.max(1);
            self.config.height = height.max(1);
            self.device_pixel_ratio = device_pixel_ratio;
            self.surface.configure(&self.device, &self.config);
        }

        fn ensure_instance_capacity(&mut self, count: u64) {
            if count <= self.instance_capacity {
                return;
            }
            let capacity = count.next_power_of_two();
            let size = std::mem::size_of::<InstanceUniforms>() as u64;
            self.instance_buffer =
                uniform_buffer(&self.device, "panorama-instances", self.uniform_stride * capacity);
            self.instance_bind_group = uniform_bind_group(
                &self.device,
                "panorama-instance-bg",
                &self.instance_layout,
                &self.instance_buffer,
                size,
            );
            self.instance_capacity = capacity;
        }

        /// Replays `frame` once per eye pass of `plan`, each pass clipped to
        /// its viewport.
        pub fn render(&mut self, plan: &RenderPlan, frame: &RenderFrame) -> Result<(), JsValue> {
            let mut instances = Vec::with_capacity(frame.commands.len());
            for command in &frame.commands {
                match command {
                    RenderCommand::Panorama { model } => {
                        if self.panorama.is_some() {
                            instances.push((InstanceUniforms::new(model, [1.0; 4], true), None, None));
                        }
                    }
                    RenderCommand::Mesh {
                        model,
                        mesh,
                        color,
                        icon,
                    } => {
                        let icon = icon.as_deref().filter(|path| self.icons.contains_key(*path));
                        instances.push((
                            InstanceUniforms::new(model, *color, icon.is_some()),
                            Some(*mesh),
                            icon.map(str::to_string),
                        ));
                    }
                }
            }
            self.ensure_instance_capacity(instances.len() as u64);

            let stride = self.uniform_stride as usize;
            let mut instance_bytes = vec![0u8; stride * instances.len().max(1)];
            for (slot, (uniforms, _, _)) in instances.iter().enumerate() {
                let bytes = bytemuck::bytes_of(uniforms);
                instance_bytes[slot * stride..slot * stride + bytes.len()].copy_from_slice(bytes);
            }
            self.queue
                .write_buffer(&self.instance_buffer, 0, &instance_bytes);

            let passes = &plan.passes[..plan.passes.len().min(MAX_EYES as usize)];
            let mut eye_bytes = vec![0u8; stride * MAX_EYES as usize];
            for (slot, pass) in passes.iter().enumerate() {
                let uniforms = EyeUniforms::for_pass(pass);
                let bytes = bytemuck::bytes_of(&uniforms);
                eye_bytes[slot * stride..slot * stride + bytes.len()].copy_from_slice(bytes);
            }
            self.queue.write_buffer(&self.eye_buffer, 0, &eye_bytes);

            let surface_frame = self
                .surface
                .get_current_texture()
                .map_err(|e| JsValue::from_str(&format!("surface acquire failed: {e}")))?;
            let view = surface_frame
                .texture
                .create_view(&::wgpu::TextureViewDescriptor::default());
            let mut encoder = self
                .device
                .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                    label: Some("panorama-encoder"),
                });

            {
                let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                    label: Some("panorama-pass"),
                    color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: ::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(::wgpu::Color::BLACK),
                            store: ::wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });
                rpass.set_pipeline(&self.pipeline);

                let (surface_w, surface_h) = (self.config.width, self.config.height);
                for (eye_slot, pass) in passes.iter().enumerate() {
                    let [x, y, w, h] = pass.viewport.to_physical(self.device_pixel_ratio);
                    let x = x.min(surface_w - 1);
                    let y = y.min(surface_h - 1);
                    let w = w.min(surface_w - x);
                    let h = h.min(surface_h - y);
                    rpass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
                    if let Some(scissor) = pass.scissor {
                        let [sx, sy, sw, sh] = scissor.to_physical(self.device_pixel_ratio);
                        let sx = sx.min(surface_w - 1);
                        let sy = sy.min(surface_h - 1);
                        rpass.set_scissor_rect(sx, sy, sw.min(surface_w - sx), sh.min(surface_h - sy));
                    } else {
                        rpass.set_scissor_rect(0, 0, surface_w, surface_h);
                    }
                    rpass.set_bind_group(0, &self.eye_bind_group, &[(eye_slot * stride) as u32]);

                    for (slot, (_, mesh, icon)) in instances.iter().enumerate() {
                        let (mesh, texture) = match mesh {
                            None => match &self.panorama {
                                Some((_, texture)) => (&self.panorama_mesh, texture),
                                None => continue,
                            },
                            Some(kind) => {
                                let mesh = match kind {
                                    MeshKind::Sphere => &self.marker_sphere,
                                    MeshKind::Quad => &self.quad,
                                };
                                let texture = icon
                                    .as_ref()
                                    .and_then(|path| self.icons.get(path))
                                    .unwrap_or(&self.blank);
                                (mesh, texture)
                            }
                        };
                        rpass.set_bind_group(1, &self.instance_bind_group, &[(slot * stride) as u32]);
                        rpass.set_bind_group(2, &texture.bind_group, &[]);
                        rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
                        rpass.set_index_buffer(mesh.indices.slice(..), ::wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    }
                }
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            surface_frame.present();
            Ok(())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use formats::SphereConfig;
    use gpu::{RenderFrame, RenderPlan};
    use wasm_bindgen::prelude::JsValue;
    use web_sys::ImageBitmap;

    #[derive(Debug, Default)]
    pub struct Renderer;

    pub async fn init_renderer(
        _canvas_id: &str,
        _sphere: &SphereConfig,
        _device_pixel_ratio: f64,
    ) -> Result<Renderer, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    impl Renderer {
        pub fn panorama_url(&self) -> Option<&str> {
            None
        }

        pub fn set_panorama(&mut self, _url: &str, _bitmap: &ImageBitmap) {}

        pub fn has_icon(&self, _path: &str) -> bool {
            false
        }

        pub fn insert_icon(&mut self, _path: &str, _bitmap: &ImageBitmap) {}

        pub fn release_textures(&mut self) {}

        pub fn resize(&mut self, _width: u32, _height: u32, _device_pixel_ratio: f64) {}

        pub fn render(&mut self, _plan: &RenderPlan, _frame: &RenderFrame) -> Result<(), JsValue> {
            Err(JsValue::from_str(
                "wgpu rendering is only available on wasm32 targets",
            ))
        }
    }
}

pub use imp::{Renderer, init_renderer};
