//! End-to-end stage runs: scroll a page through pinned and stacked sections
//! and check the command stream a host would apply.

use scrolly_core::pin::PinConfig;
use scrolly_core::scroll::{EndPosition, Length};
use scrolly_core::{
    Phase, Rect, ScrollyConfig, SectionCommand, SectionLayout, SectionSpec, Stage,
    TargetedCommand, ViewportSize,
};

const DESKTOP: ViewportSize = ViewportSize {
    width: 1200.0,
    height: 800.0,
};
const MOBILE: ViewportSize = ViewportSize {
    width: 400.0,
    height: 800.0,
};

/// Section at y = 1000, 800 tall, with `n` 200px items stacked inside.
fn steps(n: usize) -> SectionLayout {
    SectionLayout {
        section: Rect::new(0.0, 1000.0, 1200.0, 800.0),
        items: (0..n)
            .map(|i| Some(Rect::new(0.0, 1000.0 + 200.0 * i as f64, 600.0, 200.0)))
            .collect(),
    }
}

/// Default pin range for [`steps`]: "top top" to "+=1.5x" of 800px.
const PIN_START: f64 = 1000.0;
const PIN_DISTANCE: f64 = 1200.0;

fn at(progress: f64) -> f64 {
    PIN_START + PIN_DISTANCE * progress
}

fn opacities(stage: &Stage, id: scrolly_core::SectionId) -> Vec<f64> {
    stage
        .frames(id)
        .expect("section is mounted")
        .iter()
        .map(|f| f.state.opacity)
        .collect()
}

fn ops(commands: &[TargetedCommand]) -> Vec<&SectionCommand> {
    commands.iter().map(|c| &c.command).collect()
}

#[test]
fn four_items_scrubbed_through_a_pinned_section() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(4)));

    stage.on_scroll(at(0.1));
    let frames = stage.frames(id).expect("mounted");
    assert_eq!(frames[0].phase, Phase::Enter);
    assert!(frames[0].state.opacity > 0.0 && frames[0].state.opacity < 1.0);
    assert_eq!(&opacities(&stage, id)[1..], &[0.0, 0.0, 0.0]);

    stage.on_scroll(at(0.37));
    let frames = stage.frames(id).expect("mounted");
    assert_eq!(frames[0].phase, Phase::Exit);
    assert!(frames[0].state.opacity < 1.0);
    assert!(matches!(frames[1].phase, Phase::Enter | Phase::Hold));
    assert_eq!(frames[2].state.opacity, 0.0);
    assert_eq!(frames[3].state.opacity, 0.0);
    assert_eq!(stage.active_index(id), Some(1));

    stage.on_scroll(at(1.0));
    assert_eq!(opacities(&stage, id), vec![0.0, 0.0, 0.0, 1.0]);
    assert_eq!(stage.active_index(id), Some(3));
}

#[test]
fn pin_holds_only_inside_the_range() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(3)));

    let entering = stage.on_scroll(at(0.2));
    let entering = ops(&entering);
    assert_eq!(
        entering[0],
        &SectionCommand::ReserveSpace {
            height: 800.0 + PIN_DISTANCE
        }
    );
    assert!(matches!(entering[1], SectionCommand::Fix { rect } if rect.y == 0.0));
    assert!(stage.pin_state(id).is_some_and(|s| s.pinned));

    let leaving = stage.on_scroll(at(1.0) + 50.0);
    assert!(ops(&leaving).contains(&&SectionCommand::Release {
        offset: PIN_DISTANCE
    }));
    assert!(stage.pin_state(id).is_some_and(|s| !s.pinned && s.space_reserved));

    let back = stage.on_scroll(at(0.5));
    assert!(ops(&back).iter().any(|c| matches!(c, SectionCommand::Fix { .. })));
    assert!(!ops(&back).iter().any(|c| matches!(c, SectionCommand::ReserveSpace { .. })));
}

#[test]
fn switching_to_mobile_reverts_pinning_before_stacked_reveal() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(4)));
    stage.on_scroll(at(0.5));
    assert!(stage.pin_state(id).is_some_and(|s| s.pinned));

    let mut released = stage.invalidate();
    released.extend(stage.refresh(MOBILE, &[(id, steps(4))]));
    let commands = ops(&released);

    let release = commands
        .iter()
        .position(|c| matches!(c, SectionCommand::Release { .. }))
        .expect("pin released");
    let restore = commands
        .iter()
        .position(|c| matches!(c, SectionCommand::RestoreSpace))
        .expect("space restored");
    let first_hidden = commands
        .iter()
        .position(|c| matches!(c, SectionCommand::Style { state, .. } if state.opacity == 0.0))
        .expect("stacked items hidden");
    assert!(release < restore && restore < first_hidden);
    assert!(
        !commands[restore..]
            .iter()
            .any(|c| matches!(c, SectionCommand::Fix { .. } | SectionCommand::ReserveSpace { .. }))
    );

    // Every item was cleared exactly once before the stacked reveal took it.
    for index in 0..4 {
        let cleared = commands
            .iter()
            .position(|c| **c == SectionCommand::ClearStyle { index })
            .expect("cleared");
        assert!(cleared < first_hidden);
    }

    assert_eq!(stage.mode(), scrolly_core::AnimationMode::Stacked);
    assert_eq!(stage.pin_state(id), Some(Default::default()));
    assert_eq!(stage.progress(id), None);
    assert!(!stage.needs_refresh());

    // Further scrolling never pins again.
    let later = stage.on_scroll(at(0.6));
    assert!(!ops(&later).iter().any(|c| matches!(c, SectionCommand::Fix { .. })));
}

#[test]
fn stacked_mode_reveals_over_frames() {
    let mut stage = Stage::new(ScrollyConfig::default(), MOBILE);
    let (id, mounted) = stage.mount(SectionSpec::new("steps", steps(3)));
    assert_eq!(
        ops(&mounted)
            .iter()
            .filter(|c| matches!(c, SectionCommand::Style { .. }))
            .count(),
        3
    );
    assert!(!stage.needs_frame());

    // "top 85%" of the first item: 1000 - 680.
    stage.on_scroll(320.0);
    assert!(stage.needs_frame());
    let mut styled = Vec::new();
    for _ in 0..120 {
        styled.extend(stage.on_frame(1.0 / 60.0));
    }
    assert!(!styled.is_empty());
    assert!(styled.iter().all(|c| matches!(c.command, SectionCommand::Style { index: 0, .. })));
    let frames = stage.frames(id).expect("mounted");
    assert_eq!(frames[0].phase, Phase::Hold);
    assert_eq!(frames[1].phase, Phase::Pending);
}

#[test]
fn resize_within_a_mode_remeasures() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(2)));
    stage.on_scroll(at(0.5));

    let taller = ViewportSize::new(1100.0, 1000.0);
    let mut commands = stage.invalidate();
    commands.extend(stage.refresh(taller, &[(id, steps(2))]));
    let commands = ops(&commands);
    assert_eq!(commands[0], &SectionCommand::Release { offset: 0.0 });
    assert!(commands.contains(&&SectionCommand::ReserveSpace {
        height: 800.0 + PIN_DISTANCE
    }));
    assert!(commands.iter().any(|c| matches!(c, SectionCommand::Fix { .. })));
    assert_eq!(stage.mode(), scrolly_core::AnimationMode::Pinned);
}

#[test]
fn unmount_leaves_nothing_behind() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (first, _) = stage.mount(SectionSpec::new("steps", steps(3)));
    let (second, _) = stage.mount(SectionSpec::new("cards", steps(2)).pinned(false));
    stage.on_scroll(at(0.5));

    let commands = stage.revert_all();
    // Newest section first.
    assert_eq!(commands.first().map(|c| c.section), Some(second));
    assert!(commands.iter().any(|c| c.section == first
        && c.command == SectionCommand::RestoreSpace));
    assert!(stage.is_empty());
    assert!(stage.on_scroll(at(0.9)).is_empty());
    assert_eq!(stage.frames(first), None);
}

#[test]
fn empty_section_emits_nothing() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, commands) = stage.mount(SectionSpec::new("empty", steps(0)));
    assert!(commands.is_empty());
    assert!(stage.on_scroll(at(0.5)).is_empty());
    assert_eq!(stage.active_index(id), None);
    assert!(stage.unmount(id).is_empty());
}

#[test]
fn zero_distance_counts_as_elapsed() {
    let config = ScrollyConfig {
        pin: PinConfig {
            end: EndPosition::Relative(Length::Px(0.0)),
            ..PinConfig::default()
        },
        ..ScrollyConfig::default()
    };
    let mut stage = Stage::new(config, DESKTOP);
    let (id, commands) = stage.mount(SectionSpec::new("short", steps(3)));
    assert!(!ops(&commands).iter().any(|c| matches!(c, SectionCommand::Fix { .. })));
    assert_eq!(stage.progress(id), Some(1.0));
    assert_eq!(opacities(&stage, id), vec![0.0, 0.0, 1.0]);
    assert!(stage.pin_state(id).is_some_and(|s| !s.pinned));
}

#[test]
fn missing_items_are_skipped_and_renumbered() {
    let mut layout = steps(4);
    layout.items[2] = None;
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", layout));
    assert_eq!(stage.element_keys(id), Some(&[0, 1, 3][..]));

    stage.on_scroll(at(1.0));
    let frames = stage.frames(id).expect("mounted");
    assert_eq!(frames.iter().map(|f| f.index).collect::<Vec<_>>(), vec![0, 1, 3]);
    assert_eq!(frames[2].state.opacity, 1.0);
    assert_eq!(stage.active_index(id), Some(3));
}

#[test]
fn listeners_hear_each_focus_change_once() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(4)));
    let heard = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&heard);
    let _subscription = stage
        .subscribe_active(id, move |change| sink.borrow_mut().push(change.current))
        .expect("mounted");

    for step in 0..=20 {
        stage.on_scroll(at(f64::from(step) / 20.0));
    }
    assert_eq!(*heard.borrow(), vec![1, 2, 3]);
}

fn cleared(commands: &[TargetedCommand]) -> Vec<usize> {
    commands
        .iter()
        .filter_map(|c| match c.command {
            SectionCommand::ClearStyle { index } => Some(index),
            _ => None,
        })
        .collect()
}

fn styled(commands: &[TargetedCommand]) -> Vec<usize> {
    commands
        .iter()
        .filter_map(|c| match c.command {
            SectionCommand::Style { index, .. } => Some(index),
            _ => None,
        })
        .collect()
}

#[test]
fn vanished_item_is_cleared_under_its_own_ordinal_on_mode_switch() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(4)));
    stage.on_scroll(1600.0);

    let mut remeasured = steps(4);
    remeasured.items[1] = None;
    let mut commands = stage.invalidate();
    commands.extend(stage.refresh(MOBILE, &[(id, remeasured)]));

    assert_eq!(cleared(&commands), vec![0, 1, 2, 3]);
    assert!(styled(&commands).iter().all(|index| *index != 1));
    assert_eq!(stage.element_keys(id), Some(&[0, 2, 3][..]));
}

#[test]
fn vanished_item_is_cleared_under_its_own_ordinal_within_a_mode() {
    let mut stage = Stage::new(ScrollyConfig::default(), DESKTOP);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(4)));
    stage.on_scroll(at(0.5));

    let mut remeasured = steps(4);
    remeasured.items[1] = None;
    let mut commands = stage.invalidate();
    commands.extend(stage.refresh(DESKTOP, &[(id, remeasured)]));

    assert_eq!(cleared(&commands), vec![0, 1, 2, 3]);
    let last_clear = commands
        .iter()
        .rposition(|c| matches!(c.command, SectionCommand::ClearStyle { .. }))
        .expect("cleared");
    let restyled = styled(&commands[last_clear..]);
    assert_eq!(restyled, vec![0, 2, 3]);
    assert!(stage.pin_state(id).is_some_and(|s| s.pinned));
    assert_eq!(stage.element_keys(id), Some(&[0, 2, 3][..]));
}

#[test]
fn stacked_focus_follows_the_reference_line() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use scrolly_core::Trigger;

    let mut stage = Stage::new(ScrollyConfig::default(), MOBILE);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(4)));
    // Above every item: the nearest one, the first.
    assert_eq!(stage.active_index(id), Some(0));
    assert_eq!(stage.progress(id), None);

    let heard = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&heard);
    let _subscription = stage
        .subscribe_active(id, move |change| sink.borrow_mut().push((change.current, change.trigger)))
        .expect("mounted");

    // Viewport centre at 850 + 400 = 1250, inside the second item.
    stage.on_scroll(850.0);
    assert_eq!(stage.active_index(id), Some(1));
    // 1250 + 400 = 1650, inside the last item.
    stage.on_scroll(1250.0);
    assert_eq!(stage.active_index(id), Some(3));
    // Back up to 1450: the third item again.
    stage.on_scroll(1050.0);
    assert_eq!(stage.active_index(id), Some(2));

    assert_eq!(
        *heard.borrow(),
        vec![(1, Trigger::Enter), (3, Trigger::Enter), (2, Trigger::EnterBack)]
    );
}

#[test]
fn switching_to_desktop_tears_down_the_reveal_before_pinning() {
    let mut stage = Stage::new(ScrollyConfig::default(), MOBILE);
    let (id, _) = stage.mount(SectionSpec::new("steps", steps(4)));
    stage.on_scroll(at(0.5));
    // Every reveal trigger is above 1600, so all four are mid-tween.
    assert!(stage.needs_frame());

    let mut commands = stage.invalidate();
    assert!(commands.is_empty());
    commands.extend(stage.refresh(DESKTOP, &[(id, steps(4))]));
    let ordered = ops(&commands);

    let last_clear = ordered
        .iter()
        .rposition(|c| matches!(c, SectionCommand::ClearStyle { .. }))
        .expect("reveal styles cleared");
    let reserve = ordered
        .iter()
        .position(|c| matches!(c, SectionCommand::ReserveSpace { .. }))
        .expect("space reserved");
    let fix = ordered
        .iter()
        .position(|c| matches!(c, SectionCommand::Fix { .. }))
        .expect("section pinned");
    let first_style = ordered
        .iter()
        .position(|c| matches!(c, SectionCommand::Style { .. }))
        .expect("timeline styles");
    assert_eq!(cleared(&commands), vec![0, 1, 2, 3]);
    assert!(last_clear < reserve && reserve < fix && fix < first_style);

    assert_eq!(stage.mode(), scrolly_core::AnimationMode::Pinned);
    assert!(stage.pin_state(id).is_some_and(|s| s.pinned && s.space_reserved));
    assert_eq!(stage.progress(id), Some(0.5));
    assert_eq!(stage.active_index(id), Some(1));
    // The scrubbed timeline settles immediately; no reveal tween survives.
    assert!(!stage.needs_frame());
}
