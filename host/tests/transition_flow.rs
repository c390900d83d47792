//! 端到端转场时序测试
//!
//! 按默认网格配置驱动一次完整转场，验证回调顺序、触发时刻、
//! 互斥与资源释放。

use std::cell::RefCell;
use std::rc::Rc;

use host::{FrameSource, SoftwareSurface, StageHooks, TransitionCoordinator, TransitionPhase};
use stage_runtime::{SpecArg, TransitionSpec, ViewId};

/// tick 间隔：10ms，保证时刻断言有足够精度
const DT: f32 = 0.010;

/// 记录回调触发时刻的测试桩
#[derive(Clone, Default)]
struct TimelineHooks {
    events: Rc<RefCell<Vec<(String, String, f32)>>>,
    now: Rc<RefCell<f32>>,
}

impl TimelineHooks {
    fn set_now(&self, t: f32) {
        *self.now.borrow_mut() = t;
    }

    fn events_of(&self, kind: &str) -> Vec<(String, f32)> {
        self.events
            .borrow()
            .iter()
            .filter(|(k, _, _)| k == kind)
            .map(|(_, view, t)| (view.clone(), *t))
            .collect()
    }
}

impl StageHooks for TimelineHooks {
    fn on_start(&mut self, target: &ViewId) {
        let now = *self.now.borrow();
        self.events
            .borrow_mut()
            .push(("start".to_string(), target.to_string(), now));
    }
    fn on_mid(&mut self, target: &ViewId) {
        let now = *self.now.borrow();
        self.events
            .borrow_mut()
            .push(("mid".to_string(), target.to_string(), now));
    }
    fn on_end(&mut self, target: &ViewId) {
        let now = *self.now.borrow();
        self.events
            .borrow_mut()
            .push(("end".to_string(), target.to_string(), now));
    }
}

fn grid_spec() -> TransitionSpec {
    TransitionSpec::simple("grid")
        .arg("cell", SpecArg::Number(60.0))
        .arg("center_u", SpecArg::Number(0.5))
        .arg("center_v", SpecArg::Number(0.5))
}

#[test]
fn grid_transition_timeline() {
    let mut coordinator = TransitionCoordinator::new();
    let mut surface = SoftwareSurface::new(1280, 720);
    let mut hooks = TimelineHooks::default();

    // t = 0: 请求被接受，on_start 同步触发
    let accepted = coordinator.start_transition(
        ViewId::new("section1"),
        &grid_spec(),
        surface.viewport(),
        &mut hooks,
    );
    assert!(accepted);
    assert_eq!(hooks.events_of("start"), vec![("section1".to_string(), 0.0)]);

    let mut t = 0.0f32;
    let mut second_request_checked = false;
    for _ in 0..2000 {
        if !coordinator.is_active() {
            break;
        }
        t += DT;
        hooks.set_now(t);
        coordinator.tick(DT, &mut surface, &mut hooks);

        // t = 100ms：转场进行中，新请求必须被拒绝且无状态变化
        if !second_request_checked && t >= 0.1 {
            second_request_checked = true;
            let rejected = coordinator.start_transition(
                ViewId::new("section2"),
                &grid_spec(),
                surface.viewport(),
                &mut hooks,
            );
            assert!(!rejected);
            assert_eq!(coordinator.state().to_view, Some(ViewId::new("section1")));
        }
    }

    assert!(second_request_checked);
    assert_eq!(coordinator.phase(), TransitionPhase::Idle);

    // on_mid 恰好一次，时刻 ≈ 280+460 = 740ms，上界 780ms（含 slack）
    let mids = hooks.events_of("mid");
    assert_eq!(mids.len(), 1);
    assert_eq!(mids[0].0, "section1");
    assert!(mids[0].1 >= 0.74 - 1e-3, "on_mid 过早: {}s", mids[0].1);
    assert!(mids[0].1 <= 0.78 + DT, "on_mid 过晚: {}s", mids[0].1);

    // on_end 恰好一次，相对 on_mid ≈ 520+460 = 980ms，上界 1020ms
    let ends = hooks.events_of("end");
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].0, "section1");
    let reveal_elapsed = ends[0].1 - mids[0].1;
    assert!(reveal_elapsed >= 0.98 - 1e-3, "on_end 过早: {}s", reveal_elapsed);
    assert!(reveal_elapsed <= 1.02 + DT, "on_end 过晚: {}s", reveal_elapsed);

    // 没有 on_start 之外的多余触发
    assert_eq!(hooks.events_of("start").len(), 1);

    // 资源安全：没有滞留的捕获帧或纹理
    assert_eq!(coordinator.live_captures(), 0);
    assert_eq!(surface.outstanding_slots(), 0);
}

#[test]
fn repeated_transitions_do_not_leak() {
    let mut coordinator = TransitionCoordinator::new();
    let mut surface = SoftwareSurface::new(640, 360);
    let mut hooks = TimelineHooks::default();

    // 轮流使用需要采集与不需要采集的策略
    let specs = [
        TransitionSpec::simple("noise"),
        TransitionSpec::simple("grid"),
        TransitionSpec::simple("noise"),
        TransitionSpec::simple("fade"),
    ];

    for (index, spec) in specs.iter().enumerate() {
        let accepted = coordinator.start_transition(
            ViewId::new(format!("view{}", index)),
            spec,
            surface.viewport(),
            &mut hooks,
        );
        assert!(accepted);

        for _ in 0..2000 {
            if !coordinator.is_active() {
                break;
            }
            coordinator.tick(DT, &mut surface, &mut hooks);
        }
        assert_eq!(coordinator.phase(), TransitionPhase::Idle);
        assert_eq!(coordinator.live_captures(), 0, "第 {} 次转场后捕获帧泄漏", index);
        assert_eq!(
            surface.outstanding_slots(),
            0,
            "第 {} 次转场后纹理未归还",
            index
        );
    }

    assert_eq!(hooks.events_of("end").len(), specs.len());
    assert_eq!(
        coordinator.current_view(),
        Some(&ViewId::new("view3"))
    );
}
