//! # MaskPass 模块
//!
//! wgpu 遮罩合成通道：把活跃策略的遮罩参数变成屏幕上的覆盖画面。
//!
//! 四个策略家族各有一条渲染管线，共用同一个 uniform 布局
//! （[`OverlayParams`]）与绑定组布局。家族用不到的纹理槽位绑定
//! 1x1 哑纹理，避免为每个家族维护一套布局。
//!
//! ## 合成语义
//!
//! 片段着色器计算当前点的"遮蔽不透明度"：
//! - 遮蔽子阶段：遮罩值本身
//! - 显露子阶段：`1 - 遮罩值`
//!
//! 有捕获帧时显露子阶段直接对旧帧交叉混合（旧画面被侵蚀出新画面）；
//! 无捕获帧时对遮蔽色（黑）混合。

use super::strategies::{OverlayParams, StrategyFamily};

/// 共享的 WGSL 头部：uniform 结构、绑定、全屏三角形顶点着色器
const SHADER_COMMON: &str = r#"
struct OverlayParams {
    resolution: vec2f,
    progress: f32,
    covering: f32,
    center: vec2f,
    window: vec2f,
    cell_size: f32,
    duration: f32,
    delay_span: f32,
    time: f32,
    reversed: f32,
    has_capture: f32,
    scale: f32,
    seed: f32,
}

@group(0) @binding(0) var<uniform> u: OverlayParams;
@group(0) @binding(1) var live_texture: texture_2d<f32>;
@group(0) @binding(2) var old_texture: texture_2d<f32>;
@group(0) @binding(3) var mask_texture: texture_2d<f32>;
@group(0) @binding(4) var overlay_sampler: sampler;

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4f {
    // 全屏三角形
    let x = f32(i32(vi) - 1);
    let y = f32(i32(vi & 1u) * 2 - 1);
    return vec4f(x, y, 0.0, 1.0);
}

// 由"子阶段完成度"得到覆盖不透明度，并完成最终混合
fn compose(uv: vec2f, mask: f32) -> vec4f {
    let live = textureSample(live_texture, overlay_sampler, uv);
    var alpha: f32;
    if (u.covering > 0.5) {
        alpha = mask;
    } else {
        alpha = 1.0 - mask;
    }

    if (u.has_capture > 0.5 && u.covering < 0.5) {
        // 显露：旧帧被侵蚀，露出下面的新内容
        let old = textureSample(old_texture, overlay_sampler, uv);
        return mix(live, old, alpha);
    }
    // 遮蔽（或无捕获帧）：对遮蔽色混合
    return mix(live, vec4f(0.0, 0.0, 0.0, 1.0), alpha);
}
"#;

/// 纯渐变：整屏统一不透明度（progress 已在 CPU 侧应用缓动）
const FADE_SHADER_BODY: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    return compose(uv, u.progress);
}
"#;

/// 程序化噪声遮罩：与 CPU 侧 fbm 逐位一致的值噪声
const NOISE_SHADER_BODY: &str = r#"
fn hash2(ix: i32, iy: i32, seed: u32) -> f32 {
    var h = bitcast<u32>(ix) * 0x85EBCA6Bu + bitcast<u32>(iy) * 0xC2B2AE35u + seed * 0x27D4EB2Fu;
    h ^= h >> 15u;
    h *= 0x2C1B3C6Du;
    h ^= h >> 12u;
    h *= 0x297A2D39u;
    h ^= h >> 15u;
    return f32(h & 0x00FFFFFFu) / 16777216.0;
}

fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    let xi = floor(x);
    let yi = floor(y);
    let xf = x - xi;
    let yf = y - yi;
    let x0 = i32(xi);
    let y0 = i32(yi);

    let uu = xf * xf * (3.0 - 2.0 * xf);
    let vv = yf * yf * (3.0 - 2.0 * yf);

    let a = hash2(x0, y0, seed);
    let b = hash2(x0 + 1, y0, seed);
    let c = hash2(x0, y0 + 1, seed);
    let d = hash2(x0 + 1, y0 + 1, seed);

    let ab = a + (b - a) * uu;
    let cd = c + (d - c) * uu;
    return ab + (cd - ab) * vv;
}

fn fbm(x: f32, y: f32, time: f32, seed: u32) -> f32 {
    var sum = 0.0;
    var amplitude = 0.5;
    var frequency = 1.0;
    var total = 0.0;

    for (var octave = 0u; octave < 4u; octave++) {
        let drift = time * (0.3 + 0.2 * f32(octave));
        sum += amplitude * value_noise(x * frequency + drift, y * frequency - drift * 0.7, seed + octave);
        total += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    return sum / total;
}

@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let aspect = u.resolution.x / u.resolution.y;
    let n = fbm(uv.x * u.scale * aspect, uv.y * u.scale, u.time, u32(u.seed));
    let mask = 1.0 - smoothstep(u.window.x, u.window.y, n);
    return compose(uv, mask);
}
"#;

/// 灰度图遮罩：阈值来自遮罩纹理亮度
const IMAGE_SHADER_BODY: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    var threshold = textureSample(mask_texture, overlay_sampler, uv).r;
    if (u.reversed > 0.5) {
        threshold = 1.0 - threshold;
    }
    let mask = 1.0 - smoothstep(u.window.x, u.window.y, threshold);
    return compose(uv, mask);
}
"#;

/// 网格擦除：逐单元格的径向错峰延迟
const GRID_SHADER_BODY: &str = r#"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let uv = pos.xy / u.resolution;
    let cell = floor(pos.xy / u.cell_size);
    let cell_center = (cell + vec2f(0.5, 0.5)) * u.cell_size;
    let center_px = u.center * u.resolution;
    let half_diagonal = length(u.resolution) / 2.0;
    let distance_norm = clamp(distance(cell_center, center_px) / half_diagonal, 0.0, 1.0);

    var staggering: f32;
    if (u.covering > 0.5) {
        staggering = 1.0 - distance_norm;
    } else {
        staggering = distance_norm;
    }

    let delay = round(staggering * u.delay_span * 1000.0) / 1000.0;
    let elapsed = u.progress * (u.duration + u.delay_span);
    var local: f32;
    if (u.duration <= 0.0) {
        local = step(delay, elapsed);
    } else {
        local = clamp((elapsed - delay) / u.duration, 0.0, 1.0);
    }
    // 单元格内部用平滑过渡代替 CPU 侧的缓动曲线
    let mask = smoothstep(0.0, 1.0, local);
    return compose(uv, mask);
}
"#;

/// 片段着色器纹理槽位的布局项
fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// wgpu 遮罩合成通道
pub struct MaskPass {
    fade_pipeline: wgpu::RenderPipeline,
    noise_pipeline: wgpu::RenderPipeline,
    image_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    /// 未用槽位的哑纹理视图
    dummy_view: wgpu::TextureView,
}

impl MaskPass {
    /// 创建遮罩合成通道
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mask Pass Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mask Pass Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mask Pass Uniforms"),
            size: std::mem::size_of::<OverlayParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Mask Pass Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // 1x1 白色哑纹理，占住家族用不到的槽位
        let dummy = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Mask Pass Dummy"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        queue.write_texture(
            dummy.as_image_copy(),
            &[255, 255, 255, 255],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let dummy_view = dummy.create_view(&wgpu::TextureViewDescriptor::default());

        let build = |body: &str, label: &str| {
            let source = format!("{SHADER_COMMON}{body}");
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
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
        };

        let fade_pipeline = build(FADE_SHADER_BODY, "Fade Mask Pipeline");
        let noise_pipeline = build(NOISE_SHADER_BODY, "Noise Mask Pipeline");
        let image_pipeline = build(IMAGE_SHADER_BODY, "Image Mask Pipeline");
        let grid_pipeline = build(GRID_SHADER_BODY, "Grid Mask Pipeline");

        Self {
            fade_pipeline,
            noise_pipeline,
            image_pipeline,
            grid_pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            dummy_view,
        }
    }

    fn pipeline(&self, family: StrategyFamily) -> &wgpu::RenderPipeline {
        match family {
            StrategyFamily::Fade => &self.fade_pipeline,
            StrategyFamily::Noise => &self.noise_pipeline,
            StrategyFamily::Image => &self.image_pipeline,
            StrategyFamily::Grid => &self.grid_pipeline,
        }
    }

    /// 录制遮罩合成
    ///
    /// # 参数
    /// - `target`: 输出目标
    /// - `live_view`: 当前（新）内容
    /// - `old_view`: 捕获的旧帧，无捕获时传 `None`
    /// - `mask_view`: 灰度遮罩纹理（仅 Image 家族），其余传 `None`
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        live_view: &wgpu::TextureView,
        old_view: Option<&wgpu::TextureView>,
        mask_view: Option<&wgpu::TextureView>,
        family: StrategyFamily,
        params: OverlayParams,
    ) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[params]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mask Pass Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(live_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(
                        old_view.unwrap_or(&self.dummy_view),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(
                        mask_view.unwrap_or(&self.dummy_view),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mask Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(self.pipeline(family));
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
