//! # Capture 模块
//!
//! 帧采集：把当前已渲染的画面读入可复用的纹理/位图，作为混合用的
//! "旧帧"。
//!
//! ## 采集路径
//!
//! 按能力探测顺序依次尝试：
//! 1. 设备侧帧拷贝（快，部分后端不支持）
//! 2. 同步像素回读（慢，兜底）
//!
//! 两条路径都必须在任何可能污染画面的状态变更之后，等待至少一个完整
//! 渲染 tick 再执行，避免采到过期或半渲染的内容。两条路径都失败时
//! 返回 [`CaptureError::Unavailable`]，由协调器降级为无需采集的策略。

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;
use tracing::warn;

use super::surface::{FrameSource, PixelFrame, TextureSlot};

/// 帧采集错误
///
/// 这些错误永远不会传播给 `start_transition` 的调用方；
/// 它们只在采集链内部驱动降级。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// 设备侧帧拷贝在当前后端不可用
    #[error("设备侧帧拷贝不可用")]
    DeviceCopyUnsupported,

    /// 像素回读失败
    #[error("像素回读失败: {message}")]
    ReadBackFailed {
        /// 错误消息
        message: String,
    },

    /// 所有采集路径均不可用
    #[error("所有采集路径均不可用")]
    Unavailable,
}

/// 捕获帧的色彩空间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// sRGB 8-bit RGBA
    Srgb8,
}

/// 捕获帧的载体
#[derive(Debug)]
pub enum FrameData {
    /// 设备侧纹理句柄（表面持有本体）
    Texture(TextureSlot),
    /// CPU 侧像素缓冲
    Pixels(PixelFrame),
}

/// 捕获帧
///
/// 由活跃转场独占持有：每次转场最多创建一次，转场回到空闲时
/// 无条件释放（正常完成或看门狗强制终止都一样）。
///
/// Drop 时递减存活计数；持有 [`FrameData::Texture`] 的帧还需要
/// 协调器先通过表面归还纹理句柄。
#[derive(Debug)]
pub struct CapturedFrame {
    /// 帧数据
    pub data: FrameData,
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
    /// 色彩空间
    pub color_space: ColorSpace,
    /// 存活计数（与 FrameCapture 共享）
    live: Rc<Cell<usize>>,
}

impl CapturedFrame {
    fn new(data: FrameData, width: u32, height: u32, live: Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            data,
            width,
            height,
            color_space: ColorSpace::Srgb8,
            live,
        }
    }

    /// 设备侧纹理句柄（若帧以纹理形式持有）
    pub fn texture_slot(&self) -> Option<TextureSlot> {
        match &self.data {
            FrameData::Texture(slot) => Some(*slot),
            FrameData::Pixels(_) => None,
        }
    }
}

impl Drop for CapturedFrame {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// 帧采集器
///
/// 管理"等待渲染 tick 稳定 → 依序尝试采集路径"的流程，并持有
/// 泄漏检测用的存活计数。
#[derive(Debug)]
pub struct FrameCapture {
    /// 存活的捕获帧计数（泄漏检测钩子）
    live: Rc<Cell<usize>>,
    /// 是否有待执行的采集请求
    pending: bool,
    /// 请求之后已经过的渲染 tick 数
    ticks_waited: u32,
}

impl FrameCapture {
    /// 采集前必须等待的完整渲染 tick 数
    pub const SETTLE_TICKS: u32 = 1;

    /// 创建帧采集器
    pub fn new() -> Self {
        Self {
            live: Rc::new(Cell::new(0)),
            pending: false,
            ticks_waited: 0,
        }
    }

    /// 发起采集请求
    ///
    /// 实际采集发生在之后的渲染 tick 上（见 [`tick`](Self::tick)）。
    pub fn request(&mut self) {
        self.pending = true;
        self.ticks_waited = 0;
    }

    /// 取消未执行的采集请求
    pub fn cancel(&mut self) {
        self.pending = false;
        self.ticks_waited = 0;
    }

    /// 是否有待执行的采集请求
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// 记录一个渲染 tick
    ///
    /// # 返回
    /// - `true`: 画面已稳定，可以执行 [`attempt`](Self::attempt)
    /// - `false`: 仍需等待，或没有待执行的请求
    pub fn tick(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.ticks_waited += 1;
        self.ticks_waited >= Self::SETTLE_TICKS
    }

    /// 依序尝试采集路径
    ///
    /// 设备侧拷贝失败时记录日志并回退到像素回读；两者都失败返回
    /// [`CaptureError::Unavailable`]。无论成败，请求都被消耗。
    pub fn attempt(
        &mut self,
        surface: &mut dyn FrameSource,
    ) -> Result<CapturedFrame, CaptureError> {
        self.pending = false;
        self.ticks_waited = 0;

        let viewport = surface.viewport();

        match surface.copy_frame_texture() {
            Ok(slot) => {
                return Ok(CapturedFrame::new(
                    FrameData::Texture(slot),
                    viewport.width,
                    viewport.height,
                    self.live.clone(),
                ));
            }
            Err(e) => {
                warn!(error = %e, "设备侧帧拷贝失败，回退到像素回读");
            }
        }

        match surface.read_frame_pixels() {
            Ok(frame) => {
                let (width, height) = (frame.width, frame.height);
                Ok(CapturedFrame::new(
                    FrameData::Pixels(frame),
                    width,
                    height,
                    self.live.clone(),
                ))
            }
            Err(e) => {
                warn!(error = %e, "像素回读失败，采集不可用");
                Err(CaptureError::Unavailable)
            }
        }
    }

    /// 当前存活的捕获帧数量（泄漏检测钩子）
    pub fn live_captures(&self) -> usize {
        self.live.get()
    }
}

impl Default for FrameCapture {
    fn default() -> Self {
        Self::new()
    }
}
