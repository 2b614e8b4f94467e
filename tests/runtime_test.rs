use std::time::Duration;

use majiang_engine::runtime::ChannelSink;
use majiang_engine::{
    BehaviorKind, Choice, Decision, EngineConfig, EngineError, EngineResult, InteractiveBehavior, PresentationEvent,
    Prompt, RoundOutcome, RoundRuntime, RulesetConfig, RulesetKind, SeatBehavior, SeatView, SimpleStrategy,
    SyncMessage, TurnChoice, VoidTimeoutPolicy,
};
use tokio::sync::mpsc;

fn config(policy: VoidTimeoutPolicy) -> EngineConfig {
    EngineConfig {
        seed: Some(17),
        void_suit_timeout_ms: 1_000,
        void_timeout_policy: policy,
        ..EngineConfig::default()
    }
}

/// 定缺一直拖着，其他决定交给 `SimpleStrategy`
struct SlowToDeclare;

impl SeatBehavior for SlowToDeclare {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Interactive
    }

    fn decide(&mut self, view: &SeatView<'_>, prompt: &Prompt) -> EngineResult<Decision<Choice>> {
        match prompt {
            Prompt::VoidSuit => Ok(Decision::Deferred),
            _ => SimpleStrategy.decide(view, prompt),
        }
    }
}

/// 测试脚本座位连续打两局，同步消息按局发出
#[tokio::test(start_paused = true)]
async fn test_scripted_session() {
    let (sync_tx, mut sync_rx) = mpsc::unbounded_channel();
    let handle = RoundRuntime::new(
        config(VoidTimeoutPolicy::Fail),
        RulesetConfig::for_kind(RulesetKind::Classic),
        0,
    )
    .with_sync(sync_tx)
    .spawn(2);

    let summaries = handle.join().await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[1].round, 2);

    let mut starts = 0;
    while let Ok(message) = sync_rx.try_recv() {
        if matches!(message, SyncMessage::StartRound { .. }) {
            starts += 1;
        }
    }
    assert_eq!(starts, 2);
}

/// 测试定缺超时：默认策略以错误结束
#[tokio::test(start_paused = true)]
async fn test_void_suit_timeout_fails() {
    let (events, _presentation) = mpsc::unbounded_channel();
    let handle = RoundRuntime::new(
        config(VoidTimeoutPolicy::Fail),
        RulesetConfig::for_kind(RulesetKind::BloodBattle),
        0,
    )
    .with_behavior(1, Box::new(InteractiveBehavior::new(events)))
    .spawn(1);

    let err = handle.join().await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::VoidSuitTimeout {
            seat: 1,
            waited_ms: 1_000
        }
    ));
}

/// 测试定缺超时：自动定缺后牌局继续
#[tokio::test(start_paused = true)]
async fn test_void_suit_timeout_auto_declares() {
    let handle = RoundRuntime::new(
        config(VoidTimeoutPolicy::AutoDeclare),
        RulesetConfig::for_kind(RulesetKind::BloodBattle),
        0,
    )
    .with_behavior(2, Box::new(SlowToDeclare))
    .spawn(1);

    let summaries = handle.join().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(!matches!(summaries[0].outcome, RoundOutcome::PlayerQuit { .. }));
}

/// 测试玩家退出：本局以退出结束，不再开新局
#[tokio::test(start_paused = true)]
async fn test_quit_ends_session() {
    let (events, _presentation) = mpsc::unbounded_channel();
    let handle = RoundRuntime::new(
        config(VoidTimeoutPolicy::Fail),
        RulesetConfig::for_kind(RulesetKind::Classic),
        0,
    )
    .with_behavior(0, Box::new(InteractiveBehavior::new(events)))
    .spawn(3);

    handle.quit(0).unwrap();
    let summaries = handle.join().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].outcome, RoundOutcome::PlayerQuit { seat: 0 });
}

async fn next_prompt(presentation: &mut mpsc::UnboundedReceiver<PresentationEvent>) -> PresentationEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), presentation.recv())
            .await
            .expect("presentation event in time")
            .expect("presentation channel open");
        if !matches!(event, PresentationEvent::ViewChanged { .. }) {
            return event;
        }
    }
}

/// 测试界面提交的出牌经座位队列生效，并通过副作用队列通知
#[tokio::test(start_paused = true)]
async fn test_submitted_throw_reaches_side_effects() {
    let (events, mut presentation) = mpsc::unbounded_channel();
    let (notice_tx, mut notices) = mpsc::unbounded_channel();
    let handle = RoundRuntime::new(
        config(VoidTimeoutPolicy::Fail),
        RulesetConfig::for_kind(RulesetKind::Classic),
        0,
    )
    .with_behavior(0, Box::new(InteractiveBehavior::new(events)))
    .with_sink(ChannelSink::new(notice_tx))
    .spawn(1);

    let mut prompt = next_prompt(&mut presentation).await;
    if let PresentationEvent::ActionsAvailable { .. } = prompt {
        handle
            .submit(0, Choice::Turn { turn: TurnChoice::Pass })
            .unwrap();
        prompt = next_prompt(&mut presentation).await;
    }
    let PresentationEvent::ThrowAvailable { allowed, .. } = prompt else {
        panic!("expected a throw prompt, got {prompt:?}");
    };
    let tile = allowed.iter().next().unwrap();
    handle.submit(0, Choice::Throw { tile }).unwrap();

    let notice = tokio::time::timeout(Duration::from_secs(5), notices.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!((notice.seat, notice.action, notice.tile), (0, "throw", Some(tile)));

    // 本局可能已经有人胡牌结束，协调器不再接收输入
    let _ = handle.quit(0);
    let summaries = handle.join().await.unwrap();
    assert_eq!(summaries.len(), 1);
    let first = summaries[0].record.discards[0];
    assert_eq!((first.seat, first.tile), (0, tile));
}
