//! 转场编排引擎 - Headless 演示
//!
//! 在软件表面上驱动完整的转场序列，把阶段推进与回调时刻打到日志里。
//! 不需要窗口或 GPU，适合快速验证策略与时序。

use clap::Parser;
use tracing::info;

use host::{StageSync, TransitionCoordinator, drive_transition, request_view_switch};
use stage_runtime::{SpecArg, TransitionSpec, ViewId};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(about = "转场编排引擎 headless 演示")]
struct Args {
    /// 效果名（noise / image / grid / fade）
    #[arg(long, default_value = "grid")]
    strategy: String,

    /// 目标视图标识
    #[arg(long, default_value = "section1")]
    target: String,

    /// 视口宽度（像素）
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// 视口高度（像素）
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// 遮蔽子阶段时长（毫秒）
    #[arg(long)]
    in_ms: Option<f32>,

    /// 显露子阶段时长（毫秒）
    #[arg(long)]
    out_ms: Option<f32>,

    /// 错峰延迟跨度（毫秒）
    #[arg(long)]
    delay_ms: Option<f32>,

    /// 网格单元格边长（像素）
    #[arg(long)]
    cell: Option<f32>,

    /// 灰度遮罩图路径（image 效果）
    #[arg(long)]
    mask: Option<String>,

    /// 渲染 tick 间隔（毫秒）
    #[arg(long, default_value_t = 16.0)]
    tick_ms: f32,

    /// 完整的 JSON 转场描述（覆盖其余效果参数）
    #[arg(long)]
    spec_json: Option<String>,
}

impl Args {
    /// 组装转场描述
    ///
    /// `--spec-json` 优先；解析失败时回退到各独立参数并记录日志。
    fn to_spec(&self) -> TransitionSpec {
        if let Some(json) = &self.spec_json {
            match serde_json::from_str::<TransitionSpec>(json) {
                Ok(spec) => return spec,
                Err(e) => {
                    tracing::warn!(error = %e, "JSON 转场描述解析失败，使用独立参数");
                }
            }
        }

        let mut spec = TransitionSpec::simple(self.strategy.clone());
        if let Some(value) = self.in_ms {
            spec = spec.arg("in", SpecArg::Number(value as f64));
        }
        if let Some(value) = self.out_ms {
            spec = spec.arg("out", SpecArg::Number(value as f64));
        }
        if let Some(value) = self.delay_ms {
            spec = spec.arg("delay", SpecArg::Number(value as f64));
        }
        if let Some(value) = self.cell {
            spec = spec.arg("cell", SpecArg::Number(value as f64));
        }
        if let Some(path) = &self.mask {
            spec = spec.arg("mask", SpecArg::Text(path.clone()));
        }
        spec
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args = Args::parse();
    let spec = args.to_spec();
    let dt = (args.tick_ms / 1000.0).max(0.001);

    let mut coordinator = TransitionCoordinator::new();
    let mut sync = StageSync::new();
    let mut surface = host::SoftwareSurface::new(args.width, args.height);
    // 模拟一帧已渲染的旧内容
    surface.fill([32, 48, 96, 255]);

    let accepted = request_view_switch(
        &mut coordinator,
        &mut sync,
        &surface,
        ViewId::new(args.target.clone()),
        &spec,
    );
    if !accepted {
        // 新建的协调器必然空闲，走到这里说明有 bug
        info!("转场请求被拒绝");
        return;
    }

    let mut elapsed = 0.0f32;
    // 安全上限：任何配置下 5 分钟都远超 跨度+slack
    let max_ticks = (300.0 / dt) as usize;
    for _ in 0..max_ticks {
        if !coordinator.is_active() {
            break;
        }
        drive_transition(&mut coordinator, &mut sync, &mut surface, dt);
        elapsed += dt;

        if let Some(mask) = coordinator.mask_at(0.5, 0.5) {
            tracing::trace!(elapsed_ms = elapsed * 1000.0, center_mask = mask, "tick");
        }
    }

    info!(
        elapsed_ms = elapsed * 1000.0,
        mounted = %sync.mounted_view().map(|v| v.as_str()).unwrap_or("-"),
        completed = sync.completed_count(),
        outstanding_captures = coordinator.live_captures(),
        "演示结束"
    );
}
