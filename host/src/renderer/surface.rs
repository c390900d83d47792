//! # Surface 模块
//!
//! 渲染表面边界：引擎通过 [`FrameSource`] 能力采集当前已渲染的画面，
//! 除此之外不直接接触任何渲染后端类型。
//!
//! 本模块同时提供 CPU 软件表面 [`SoftwareSurface`]，用于 headless
//! 演示与测试；wgpu 实现见 [`crate::renderer::gpu`]。

use std::collections::HashMap;

use crate::renderer::capture::CaptureError;

/// 视口尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
}

impl Viewport {
    /// 创建视口
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 对角线半长（像素），用于径向距离归一化
    pub fn half_diagonal(&self) -> f32 {
        let w = self.width as f32;
        let h = self.height as f32;
        (w * w + h * h).sqrt() / 2.0
    }
}

/// 设备侧捕获纹理的句柄
///
/// 纹理本体由表面持有；引擎只持有句柄，并在转场回到空闲时通过
/// [`FrameSource::release_texture`] 归还。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSlot(pub(crate) u64);

impl TextureSlot {
    /// 获取内部句柄值
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// CPU 侧像素帧（RGBA8，按行连续）
#[derive(Debug, Clone, PartialEq)]
pub struct PixelFrame {
    /// 像素数据，长度为 `width * height * 4`
    pub data: Vec<u8>,
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
}

/// 渲染表面能力：帧采集
///
/// 两条采集路径按能力探测顺序排列：
/// 1. [`copy_frame_texture`](FrameSource::copy_frame_texture)——设备侧
///    帧拷贝，快，但部分后端不支持
/// 2. [`read_frame_pixels`](FrameSource::read_frame_pixels)——同步像素
///    回读，慢，作为兜底
///
/// 任一路径失败返回 [`CaptureError`]，由 [`FrameCapture`]
/// （而非调用方）决定降级。
///
/// [`FrameCapture`]: crate::renderer::capture::FrameCapture
pub trait FrameSource {
    /// 当前视口尺寸
    fn viewport(&self) -> Viewport;

    /// 设备侧帧拷贝：把当前帧复制进表面持有的纹理，返回句柄
    fn copy_frame_texture(&mut self) -> Result<TextureSlot, CaptureError>;

    /// 同步像素回读：把当前帧读入 CPU 缓冲
    fn read_frame_pixels(&mut self) -> Result<PixelFrame, CaptureError>;

    /// 归还设备侧捕获纹理
    ///
    /// 对未知句柄的归还是无害的空操作。
    fn release_texture(&mut self, slot: TextureSlot);
}

/// CPU 软件表面
///
/// 把"帧"建模为一块 RGBA8 缓冲。用于 headless 演示与测试；
/// 两条采集路径都可以通过开关关闭，以便测试降级链。
#[derive(Debug)]
pub struct SoftwareSurface {
    width: u32,
    height: u32,
    framebuffer: Vec<u8>,
    /// 设备侧拷贝是否可用（测试开关）
    device_copy_available: bool,
    /// 像素回读是否可用（测试开关）
    readback_available: bool,
    /// 已分配的捕获纹理（句柄 -> 像素副本）
    slots: HashMap<u64, Vec<u8>>,
    next_slot: u64,
    released: usize,
}

impl SoftwareSurface {
    /// 创建软件表面，初始为全黑帧
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            framebuffer: vec![0; (width * height * 4) as usize],
            device_copy_available: true,
            readback_available: true,
            slots: HashMap::new(),
            next_slot: 1,
            released: 0,
        }
    }

    /// 用纯色填充当前帧（模拟一次渲染）
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.framebuffer.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// 关闭设备侧拷贝路径
    pub fn disable_device_copy(&mut self) {
        self.device_copy_available = false;
    }

    /// 关闭像素回读路径
    pub fn disable_readback(&mut self) {
        self.readback_available = false;
    }

    /// 当前未归还的捕获纹理数量
    pub fn outstanding_slots(&self) -> usize {
        self.slots.len()
    }

    /// 已归还的捕获纹理总数
    pub fn released_count(&self) -> usize {
        self.released
    }
}

impl FrameSource for SoftwareSurface {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    fn copy_frame_texture(&mut self) -> Result<TextureSlot, CaptureError> {
        if !self.device_copy_available {
            return Err(CaptureError::DeviceCopyUnsupported);
        }
        let slot = TextureSlot(self.next_slot);
        self.next_slot += 1;
        self.slots.insert(slot.0, self.framebuffer.clone());
        Ok(slot)
    }

    fn read_frame_pixels(&mut self) -> Result<PixelFrame, CaptureError> {
        if !self.readback_available {
            return Err(CaptureError::ReadBackFailed {
                message: "像素回读被禁用".to_string(),
            });
        }
        Ok(PixelFrame {
            data: self.framebuffer.clone(),
            width: self.width,
            height: self.height,
        })
    }

    fn release_texture(&mut self, slot: TextureSlot) {
        if self.slots.remove(&slot.0).is_some() {
            self.released += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_diagonal() {
        // 3-4-5 三角形：对角线 1000，半长 500
        let vp = Viewport::new(600, 800);
        assert!((vp.half_diagonal() - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_software_surface_copy_and_release() {
        let mut surface = SoftwareSurface::new(4, 4);
        surface.fill([10, 20, 30, 255]);

        let slot = surface.copy_frame_texture().unwrap();
        assert_eq!(surface.outstanding_slots(), 1);

        // 拷贝是快照：后续 fill 不影响已捕获内容
        surface.fill([0, 0, 0, 255]);
        assert_eq!(surface.slots[&slot.value()][0], 10);

        surface.release_texture(slot);
        assert_eq!(surface.outstanding_slots(), 0);
        assert_eq!(surface.released_count(), 1);

        // 重复归还无害
        surface.release_texture(slot);
        assert_eq!(surface.released_count(), 1);
    }

    #[test]
    fn test_software_surface_readback() {
        let mut surface = SoftwareSurface::new(2, 2);
        surface.fill([1, 2, 3, 4]);

        let frame = surface.read_frame_pixels().unwrap();
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.data.len(), 16);
        assert_eq!(&frame.data[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_disabled_paths_return_errors() {
        let mut surface = SoftwareSurface::new(2, 2);
        surface.disable_device_copy();
        surface.disable_readback();

        assert!(matches!(
            surface.copy_frame_texture(),
            Err(CaptureError::DeviceCopyUnsupported)
        ));
        assert!(matches!(
            surface.read_frame_pixels(),
            Err(CaptureError::ReadBackFailed { .. })
        ));
    }
}
