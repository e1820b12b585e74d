//! The voting session state machine.
//!
//! A [`Navigator`] owns the selections made so far and a cursor naming the
//! current page and state. It reacts to three kinds of input: a key press, a
//! touch on a target, and an idle timeout. Each returns the [`Effects`] the
//! host should carry out.
//!
//! Only a [`Verified`] ballot can drive a navigator, so every index it
//! follows is known to be in bounds. Should one escape regardless, indexing
//! panics rather than clamping.
//!
//! ```ignore
//! let verified = Verified::new(&ballot)?;
//! let (mut navigator, effects) = Navigator::new(verified);
//! effects.publish(&mut audio, &mut video, &mut recorder);
//!
//! navigator.press(key).publish(&mut audio, &mut video, &mut recorder);
//! ```

pub mod effects;

pub use effects::{AudioSink, Effects, Frame, Outcome, Paste, Recorder, VideoSink};

use alloc::{vec, vec::Vec};
use core::time::Duration;

use either::Either::{Left, Right};
use tracing::{debug, trace};

use crate::{
    ballot::{
        Address, Binding, Condition, Group, Model, Op, Page, Predicate, Segment, SegmentKind, Step,
    },
    verify::Verified,
};

/// Session state over a verified ballot.
#[derive(Debug, Clone)]
pub struct Navigator<'a> {
    model: &'a Model,
    selections: Vec<Vec<u32>>,
    page_i: usize,
    state_i: usize,
    finalized: bool,
}

impl<'a> Navigator<'a> {
    /// Start a session at page 0, state 0, with nothing selected.
    ///
    /// The returned effects cover entry into the first state.
    pub fn new(ballot: Verified<'a>) -> (Self, Effects) {
        let model = &ballot.ballot().model;
        let mut navigator = Self {
            model,
            selections: vec![Vec::new(); model.groups.len()],
            page_i: 0,
            state_i: 0,
            finalized: false,
        };

        let mut fx = Effects::default();
        navigator.goto(&mut fx, 0, 0);
        navigator.render(&mut fx);

        (navigator, fx)
    }

    /// Selections made so far, one list per group.
    pub fn selections(&self) -> &[Vec<u32>] {
        &self.selections
    }

    pub fn page_i(&self) -> usize {
        self.page_i
    }

    pub fn state_i(&self) -> usize {
        self.state_i
    }

    /// Idle time after which [`Navigator::timeout`] should be called.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.model.timeout_ms))
    }

    /// Handle a key press.
    ///
    /// Returns empty effects if no binding of the current state or page
    /// responds to the key.
    pub fn press(&mut self, key: u32) -> Effects {
        self.trigger(|b| b.key == Some(key))
    }

    /// Handle a touch on one of the current layout's targets.
    pub fn touch(&mut self, target_i: u32) -> Effects {
        self.trigger(|b| b.target_i == Some(target_i))
    }

    /// Handle an idle timeout: play the current state's timeout feedback,
    /// then move to its timeout target.
    pub fn timeout(&mut self) -> Effects {
        let state = &self.page().states[self.state_i];
        let mut fx = Effects::default();

        self.play(&mut fx, &state.timeout_segments, None);
        let (page_i, state_i) = state.timeout_target();
        self.goto(&mut fx, page_i, state_i);
        self.render(&mut fx);

        fx
    }

    fn page(&self) -> &'a Page {
        let model = self.model;
        &model.pages[self.page_i]
    }

    /// Invoke the first matching binding, state scope before page scope.
    fn trigger(&mut self, matches: impl Fn(&Binding) -> bool) -> Effects {
        let page = self.page();
        let state = &page.states[self.state_i];

        let binding = state
            .bindings
            .iter()
            .chain(&page.bindings)
            .find(|b| matches(b) && self.test(&b.conditions));

        match binding {
            Some(binding) => self.invoke(binding),
            None => Effects::default(),
        }
    }

    fn invoke(&mut self, binding: &'a Binding) -> Effects {
        trace!(key = ?binding.key, target = ?binding.target_i, "invoking binding");

        let mut outcome = Outcome::Default;
        for step in &binding.steps {
            let (group_i, option_i) = self.resolve(step);
            let group = &self.model.groups[group_i];

            match select(step.op, group, &mut self.selections[group_i], option_i) {
                Outcome::Default => {}
                result => outcome = result,
            }
        }

        let mut fx = Effects {
            stop: true,
            outcome: Some(outcome),
            ..Effects::default()
        };

        self.play(&mut fx, &binding.segments, binding.steps.first());
        if let Some((page_i, state_i)) = binding.next() {
            self.goto(&mut fx, page_i, state_i);
        }
        self.render(&mut fx);

        fx
    }

    fn goto(&mut self, fx: &mut Effects, page_i: u32, state_i: u32) {
        let (page_i, state_i) = (page_i as usize, state_i as usize);

        if page_i == self.model.pages.len() - 1 && !self.finalized {
            self.finalized = true;
            fx.finalized = Some(self.selections.clone());
        }

        self.page_i = page_i;
        self.state_i = state_i;
        debug!(page = page_i, state = state_i, "entered state");

        let state = &self.page().states[state_i];
        self.play(fx, &state.segments, None);
    }

    /// Group and option an address refers to on the current page.
    fn resolve(&self, address: &impl Address) -> (usize, u32) {
        match address.address() {
            Left((group_i, option_i)) => (group_i as usize, option_i),
            Right(area_i) => {
                let area = &self.page().option_areas[area_i as usize];
                (area.group_i as usize, area.option_i)
            }
        }
    }

    fn is_selected(&self, (group_i, option_i): (usize, u32)) -> bool {
        self.selections[group_i].contains(&option_i)
    }

    /// Evaluate a conjunction of conditions.
    fn test(&self, conditions: &[Condition]) -> bool {
        conditions.iter().all(|condition| {
            let (group_i, option_i) = self.resolve(condition);
            let selections = &self.selections[group_i];

            let holds = match condition.predicate {
                Predicate::GroupEmpty => selections.is_empty(),
                Predicate::GroupFull => {
                    selections.len() == self.model.groups[group_i].max_sels as usize
                }
                Predicate::OptionSelected => selections.contains(&option_i),
            };

            holds != condition.invert
        })
    }

    /// Request the clips of each segment whose conditions hold.
    fn play(&self, fx: &mut Effects, segments: &[Segment], action: Option<&Step>) {
        for segment in segments {
            if !self.test(&segment.conditions) {
                continue;
            }

            let clip_i = segment.clip_i;

            match segment.kind {
                SegmentKind::Clip => fx.play(clip_i),
                SegmentKind::Option => self.play_option(fx, self.resolve(segment), clip_i),
                SegmentKind::StateOption => self.play_option(fx, self.state_option(), clip_i),
                SegmentKind::ActionOption => {
                    self.play_option(fx, self.action_option(action), clip_i)
                }
                SegmentKind::OptionFlag => {
                    let selected = self.is_selected(self.resolve(segment));
                    fx.play(clip_i + u32::from(selected));
                }
                SegmentKind::StateOptionFlag => {
                    let selected = self.is_selected(self.state_option());
                    fx.play(clip_i + u32::from(selected));
                }
                SegmentKind::ActionOptionFlag => {
                    let selected = self.is_selected(self.action_option(action));
                    fx.play(clip_i + u32::from(selected));
                }
                SegmentKind::Selections => {
                    let (group_i, _) = self.resolve(segment);
                    for &option_i in &self.selections[group_i] {
                        self.play_option(fx, (group_i, option_i), clip_i);
                    }
                }
                SegmentKind::SelectionCount => {
                    let (group_i, _) = self.resolve(segment);
                    fx.play(clip_i + self.selections[group_i].len() as u32);
                }
                SegmentKind::Capacity => {
                    let (group_i, _) = self.resolve(segment);
                    fx.play(clip_i + self.model.groups[group_i].max_sels);
                }
            }
        }
    }

    /// Request one of an option's clips, followed by the clip of each
    /// character written into its write-in.
    fn play_option(&self, fx: &mut Effects, (group_i, option_i): (usize, u32), offset: u32) {
        let option = &self.model.groups[group_i].options[option_i as usize];
        fx.play(option.clip_i + offset);

        if let Some(writein_i) = option.writein_group_i {
            let writein = &self.model.groups[writein_i as usize];
            for &char_i in &self.selections[writein_i as usize] {
                fx.play(writein.options[char_i as usize].clip_i);
            }
        }
    }

    /// The option of the area sharing the current state's index.
    fn state_option(&self) -> (usize, u32) {
        let area = &self.page().option_areas[self.state_i];
        (area.group_i as usize, area.option_i)
    }

    /// The option addressed by the triggering binding's first step.
    fn action_option(&self, action: Option<&Step>) -> (usize, u32) {
        match action {
            Some(step) => self.resolve(step),
            None => unreachable!(),
        }
    }

    /// Describe the current page's screen.
    fn render(&self, fx: &mut Effects) {
        let groups = &self.model.groups;
        let page = self.page();
        let mut pastes = vec![Paste {
            sprite_i: page.states[self.state_i].sprite_i,
            slot_i: self.state_i as u32,
        }];

        let mut slot_i = page.states.len() as u32;

        for area in &page.option_areas {
            let group = &groups[area.group_i as usize];
            let option = &group.options[area.option_i as usize];
            let selected = self.is_selected((area.group_i as usize, area.option_i));

            pastes.push(Paste {
                sprite_i: option.sprite_i + u32::from(selected),
                slot_i,
            });
            slot_i += 1;

            if let Some(writein_i) = option.writein_group_i {
                if selected {
                    self.paste_chars(&mut pastes, writein_i, slot_i);
                }
                slot_i += group.max_chars;
            }
        }

        for area in &page.counter_areas {
            pastes.push(Paste {
                sprite_i: area.sprite_i + self.selections[area.group_i as usize].len() as u32,
                slot_i,
            });
            slot_i += 1;
        }

        for area in &page.review_areas {
            let group = &groups[area.group_i as usize];
            let selections = &self.selections[area.group_i as usize];

            for k in 0..group.max_sels as usize {
                match selections.get(k) {
                    Some(&option_i) => {
                        let option = &group.options[option_i as usize];
                        pastes.push(Paste {
                            sprite_i: option.sprite_i,
                            slot_i,
                        });
                        if let Some(writein_i) = option.writein_group_i {
                            self.paste_chars(&mut pastes, writein_i, slot_i + 1);
                        }
                    }
                    None if k == selections.len() => {
                        if let Some(sprite_i) = area.cursor_sprite_i {
                            pastes.push(Paste { sprite_i, slot_i });
                        }
                    }
                    None => {}
                }
                slot_i += 1 + group.max_chars;
            }
        }

        fx.frame = Some(Frame {
            layout_i: self.page_i as u32,
            pastes,
        });
    }

    /// Paste the characters of a write-in into consecutive slots.
    fn paste_chars(&self, pastes: &mut Vec<Paste>, writein_i: u32, first_i: u32) {
        let writein = &self.model.groups[writein_i as usize];
        let chars = &self.selections[writein_i as usize];

        for (k, &char_i) in chars.iter().take(writein.max_sels as usize).enumerate() {
            pastes.push(Paste {
                sprite_i: writein.options[char_i as usize].sprite_i,
                slot_i: first_i + k as u32,
            });
        }
    }
}

/// Apply one selection operation to a group's selection list.
///
/// | op               | option present           | option absent            |
/// |------------------|--------------------------|--------------------------|
/// | `Select`         | no effect                | append, or full          |
/// | `Deselect`       | remove                   | no effect                |
/// | `Toggle`         | remove, toggle off       | append, or full          |
/// | `Append`         | append, or full          | append, or full          |
/// | `AppendGuarded`  | as `Append`; empty if the list was empty              |
/// | `Pop`            | remove the last entry, or empty                     |
///
/// Removal takes the first occurrence. A guarded append to an empty list
/// reports full rather than empty when there is no room.
pub fn select(op: Op, group: &Group, selections: &mut Vec<u32>, option_i: u32) -> Outcome {
    let position = selections.iter().position(|&s| s == option_i);

    match op {
        Op::Select => match position {
            Some(_) => Outcome::NoEffect,
            None => append(group, selections, option_i),
        },
        Op::Deselect => match position {
            Some(i) => {
                selections.remove(i);
                Outcome::Default
            }
            None => Outcome::NoEffect,
        },
        Op::Toggle => match position {
            Some(i) => {
                selections.remove(i);
                Outcome::ToggleOff
            }
            None => append(group, selections, option_i),
        },
        Op::Append => append(group, selections, option_i),
        Op::AppendGuarded => {
            let was_empty = selections.is_empty();
            match append(group, selections, option_i) {
                Outcome::Default if was_empty => Outcome::Empty,
                outcome => outcome,
            }
        }
        Op::Pop => match selections.pop() {
            Some(_) => Outcome::Default,
            None => Outcome::Empty,
        },
    }
}

fn append(group: &Group, selections: &mut Vec<u32>, option_i: u32) -> Outcome {
    if selections.len() < group.max_sels as usize {
        selections.push(option_i);
        Outcome::Default
    } else {
        Outcome::Full
    }
}
