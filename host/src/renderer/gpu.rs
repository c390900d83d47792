//! # GPU 模块
//!
//! [`FrameSource`] 的 wgpu 实现。
//!
//! 两条采集路径：
//! - 设备侧 `copy_texture_to_texture`——快路径，要求源纹理带
//!   `COPY_SRC` 用途
//! - `copy_texture_to_buffer` + `map_async` + 阻塞 poll 的像素回读
//!   ——慢路径，处理 256 字节的行对齐

use std::collections::HashMap;

use super::capture::CaptureError;
use super::surface::{FrameSource, PixelFrame, TextureSlot, Viewport};

/// 把每行字节数向上对齐到 wgpu 的拷贝行对齐要求（256 字节）
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// 创建无窗口的 wgpu 设备（离屏渲染/调试用）
///
/// 没有可用适配器时返回 `None`，调用方应回退到软件表面。
pub fn create_headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
}

/// wgpu 帧源
///
/// 持有设备、队列与"当前帧"纹理（宿主每帧渲染到该纹理）。
/// 捕获纹理由本结构体持有，引擎只拿 [`TextureSlot`] 句柄。
pub struct WgpuFrameSource {
    device: wgpu::Device,
    queue: wgpu::Queue,
    /// 宿主渲染的当前帧
    source: wgpu::Texture,
    /// 已分配的捕获纹理
    slots: HashMap<u64, wgpu::Texture>,
    next_slot: u64,
}

impl WgpuFrameSource {
    /// 创建 wgpu 帧源
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, source: wgpu::Texture) -> Self {
        Self {
            device,
            queue,
            source,
            slots: HashMap::new(),
            next_slot: 1,
        }
    }

    /// 更换"当前帧"纹理（例如窗口尺寸变化后）
    pub fn set_source(&mut self, source: wgpu::Texture) {
        self.source = source;
    }

    /// 取捕获纹理的视图（合成层作为"旧帧"采样）
    pub fn texture_view(&self, slot: TextureSlot) -> Option<wgpu::TextureView> {
        self.slots
            .get(&slot.value())
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()))
    }
}

impl FrameSource for WgpuFrameSource {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.source.width(), self.source.height())
    }

    fn copy_frame_texture(&mut self) -> Result<TextureSlot, CaptureError> {
        if !self.source.usage().contains(wgpu::TextureUsages::COPY_SRC) {
            return Err(CaptureError::DeviceCopyUnsupported);
        }

        let size = wgpu::Extent3d {
            width: self.source.width(),
            height: self.source.height(),
            depth_or_array_layers: 1,
        };

        let capture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Captured Frame"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.source.format(),
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Capture Encoder"),
            });
        encoder.copy_texture_to_texture(
            self.source.as_image_copy(),
            capture.as_image_copy(),
            size,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slot = TextureSlot(self.next_slot);
        self.next_slot += 1;
        self.slots.insert(slot.value(), capture);
        Ok(slot)
    }

    fn read_frame_pixels(&mut self) -> Result<PixelFrame, CaptureError> {
        if !self.source.usage().contains(wgpu::TextureUsages::COPY_SRC) {
            return Err(CaptureError::ReadBackFailed {
                message: "源纹理缺少 COPY_SRC 用途".to_string(),
            });
        }

        let width = self.source.width();
        let height = self.source.height();
        let padded = padded_bytes_per_row(width);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Readback Buffer"),
            size: (padded * height) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            self.source.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        // 同步回读：映射请求 + 阻塞 poll
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(CaptureError::ReadBackFailed {
                    message: e.to_string(),
                });
            }
            Err(_) => {
                return Err(CaptureError::ReadBackFailed {
                    message: "映射回调未送达".to_string(),
                });
            }
        }

        // 去掉行对齐填充
        let mapped = slice.get_mapped_range();
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for row in 0..height {
            let start = (row * padded) as usize;
            data.extend_from_slice(&mapped[start..start + (width * 4) as usize]);
        }
        drop(mapped);
        buffer.unmap();

        Ok(PixelFrame {
            data,
            width,
            height,
        })
    }

    fn release_texture(&mut self, slot: TextureSlot) {
        self.slots.remove(&slot.value());
    }
}
