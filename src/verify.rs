//! Static consistency checks over a decoded ballot.
//!
//! [`verify`] proves that every index the [`Navigator`](crate::Navigator) will
//! dereference is in bounds, that every sprite it will paste matches the slot
//! it is pasted into, and that every clip it will request exists. It reports
//! the first violated rule together with the entity that violated it.
//!
//! The page layout assigns slots in a fixed order: one per state, then one per
//! option area (followed by `max_chars` character slots when the area's option
//! hosts a write-in), one per counter area, and `max_sels * (1 + max_chars)`
//! per review area.
//!
//! A [`Verified`] token can only be obtained by passing these checks, and is
//! required to construct a navigator.

use core::{fmt, ops::Range};

use either::Either::{Left, Right};
use thiserror::Error;
use tracing::warn;

use crate::{
    ballot::{
        Address, Ballot, Binding, Choice, Condition, Group, Image, Layout, Op, Page, Predicate,
        Rect, Segment, SegmentKind, Step,
    },
    wire::{PRINTABLE, TEXT_CAP},
};

/// The first rule a ballot violates, and where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{at}: {rule}")]
pub struct Error {
    pub at: Location,
    pub rule: Rule,
}

/// The entity violating a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Ballot,
    Video,
    Group(usize),
    Choice { group: usize, option: usize },
    TextGroup(usize),
    Clip(usize),
    Sprite(usize),
    Layout(usize),
    Page(usize),
    PageBinding { page: usize, binding: usize },
    State { page: usize, state: usize },
    StateBinding { page: usize, state: usize, binding: usize },
    OptionArea { page: usize, area: usize },
    CounterArea { page: usize, area: usize },
    ReviewArea { page: usize, area: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Ballot => write!(f, "ballot"),
            Self::Video => write!(f, "video"),
            Self::Group(g) => write!(f, "group {g}"),
            Self::Choice { group, option } => write!(f, "group {group} option {option}"),
            Self::TextGroup(g) => write!(f, "text group {g}"),
            Self::Clip(c) => write!(f, "clip {c}"),
            Self::Sprite(s) => write!(f, "sprite {s}"),
            Self::Layout(l) => write!(f, "layout {l}"),
            Self::Page(p) => write!(f, "page {p}"),
            Self::PageBinding { page, binding } => write!(f, "page {page} binding {binding}"),
            Self::State { page, state } => write!(f, "page {page} state {state}"),
            Self::StateBinding {
                page,
                state,
                binding,
            } => write!(f, "page {page} state {state} binding {binding}"),
            Self::OptionArea { page, area } => write!(f, "page {page} option area {area}"),
            Self::CounterArea { page, area } => write!(f, "page {page} counter area {area}"),
            Self::ReviewArea { page, area } => write!(f, "page {page} review area {area}"),
        }
    }
}

/// A violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rule {
    #[error("no groups")]
    NoGroups,
    #[error("no pages")]
    NoPages,
    #[error("no states")]
    NoStates,
    #[error("{layouts} layouts for {pages} pages")]
    LayoutCount { layouts: usize, pages: usize },
    #[error("{text} text groups for {groups} groups")]
    TextGroupCount { text: usize, groups: usize },
    #[error("{text} option names for {options} options")]
    TextOptionCount { text: usize, options: usize },
    #[error("text of {0} bytes exceeds the limit")]
    TextTooLong(usize),
    #[error("non-printable byte ({0}) in text")]
    TextNotPrintable(u8),
    #[error("group {0} out of range")]
    GroupOutOfRange(u32),
    #[error("option {0} out of range")]
    OptionOutOfRange(u32),
    #[error("option area {0} out of range")]
    OptionAreaOutOfRange(u32),
    #[error("page {0} out of range")]
    PageOutOfRange(u32),
    #[error("state {0} out of range")]
    StateOutOfRange(u32),
    #[error("target {0} out of range")]
    TargetOutOfRange(u32),
    #[error("slot {0} out of range")]
    SlotOutOfRange(u64),
    #[error("sprite {0} out of range")]
    SpriteOutOfRange(u64),
    #[error("clip {0} out of range")]
    ClipOutOfRange(u64),
    #[error("clip offset {offset} not below the group's {option_clips} option clips")]
    ClipOffsetOutOfRange { offset: u32, option_clips: u32 },
    #[error("binding has neither key nor target")]
    NoTrigger,
    #[error("state {0} has no option area for its segments")]
    NoStateOption(usize),
    #[error("segment refers to an action option without a step")]
    NoActionOption,
    #[error("write-in group {0} permits characters of its own")]
    WriteinHasChars(u32),
    #[error("write-in group {group} holds {max_sels} characters, {max_chars} expected")]
    WriteinCapacity {
        group: u32,
        max_sels: u32,
        max_chars: u32,
    },
    #[error("sprite {sprite} is {sprite_size:?}, slot {slot} is {slot_size:?}")]
    SizeMismatch {
        sprite: u64,
        slot: u64,
        sprite_size: (u32, u32),
        slot_size: (u32, u32),
    },
    #[error("screen is {found:?}, canvas is {canvas:?}")]
    ScreenSize {
        found: (u32, u32),
        canvas: (u32, u32),
    },
    #[error("rectangle {0:?} extends past the canvas")]
    RectOutsideCanvas(Rect),
    #[error("canvas has no pixels")]
    EmptyCanvas,
    #[error("image has no pixels")]
    EmptyImage,
    #[error("{found} pixel bytes for a {width}x{height} image")]
    PixelLength {
        found: usize,
        width: u32,
        height: u32,
    },
    #[error("clip has no samples")]
    EmptyClip,
    #[error("clip has a partial sample")]
    PartialSample,
}

/// Check a ballot, returning the first violated rule.
pub fn verify(ballot: &Ballot) -> Result<(), Error> {
    let result = Checker { ballot }.check();

    if let Err(err) = &result {
        warn!(%err, "ballot failed verification");
    }

    result
}

/// Proof that a ballot passed [`verify`].
#[derive(Debug, Clone, Copy)]
pub struct Verified<'a>(&'a Ballot);

impl<'a> Verified<'a> {
    /// Verify a ballot, returning a token on success.
    pub fn new(ballot: &'a Ballot) -> Result<Self, Error> {
        verify(ballot)?;
        Ok(Self(ballot))
    }

    pub fn ballot(&self) -> &'a Ballot {
        self.0
    }
}

type Result<T = (), E = Error> = core::result::Result<T, E>;

/// Which states a segment list may run in.
#[derive(Clone)]
struct Scope<'b> {
    page_i: usize,
    page: &'b Page,
    layout: &'b Layout,
    /// States whose option area backs state-relative segments.
    states: Range<usize>,
    /// Step backing action-relative segments.
    action: Option<&'b Step>,
}

struct Checker<'b> {
    ballot: &'b Ballot,
}

impl<'b> Checker<'b> {
    fn check(&self) -> Result {
        let Ballot {
            model, text, video, ..
        } = self.ballot;

        if model.groups.is_empty() {
            Err(fail(Location::Ballot, Rule::NoGroups))?;
        }
        if model.pages.is_empty() {
            Err(fail(Location::Ballot, Rule::NoPages))?;
        }
        if video.layouts.len() != model.pages.len() {
            Err(fail(
                Location::Ballot,
                Rule::LayoutCount {
                    layouts: video.layouts.len(),
                    pages: model.pages.len(),
                },
            ))?;
        }
        if text.groups.len() != model.groups.len() {
            Err(fail(
                Location::Ballot,
                Rule::TextGroupCount {
                    text: text.groups.len(),
                    groups: model.groups.len(),
                },
            ))?;
        }

        self.check_video()?;
        self.check_audio()?;
        self.check_text()?;

        for (group_i, group) in model.groups.iter().enumerate() {
            self.check_group(group_i, group)?;
        }
        for (page_i, page) in model.pages.iter().enumerate() {
            self.check_page(page_i, page)?;
        }

        Ok(())
    }

    fn check_video(&self) -> Result {
        let video = &self.ballot.video;
        let canvas = (video.width, video.height);

        if video.width == 0 || video.height == 0 {
            Err(fail(Location::Video, Rule::EmptyCanvas))?;
        }

        for (layout_i, layout) in video.layouts.iter().enumerate() {
            let at = Location::Layout(layout_i);

            check_pixels(at, &layout.screen)?;
            if layout.screen.size() != canvas {
                Err(fail(
                    at,
                    Rule::ScreenSize {
                        found: layout.screen.size(),
                        canvas,
                    },
                ))?;
            }

            for rect in layout.targets.iter().chain(&layout.slots) {
                let right = u64::from(rect.left) + u64::from(rect.width);
                let bottom = u64::from(rect.top) + u64::from(rect.height);
                if right > u64::from(video.width) || bottom > u64::from(video.height) {
                    Err(fail(at, Rule::RectOutsideCanvas(*rect)))?;
                }
            }
        }

        for (sprite_i, sprite) in video.sprites.iter().enumerate() {
            check_pixels(Location::Sprite(sprite_i), sprite)?;
        }

        Ok(())
    }

    fn check_audio(&self) -> Result {
        for (clip_i, clip) in self.ballot.audio.clips.iter().enumerate() {
            if clip.samples.is_empty() {
                Err(fail(Location::Clip(clip_i), Rule::EmptyClip))?;
            }
            if clip.samples.len() % 2 != 0 {
                Err(fail(Location::Clip(clip_i), Rule::PartialSample))?;
            }
        }

        Ok(())
    }

    fn check_text(&self) -> Result {
        let groups = &self.ballot.model.groups;

        for (group_i, (text, group)) in self.ballot.text.groups.iter().zip(groups).enumerate() {
            let at = Location::TextGroup(group_i);

            if text.options.len() != group.options.len() {
                Err(fail(
                    at,
                    Rule::TextOptionCount {
                        text: text.options.len(),
                        options: group.options.len(),
                    },
                ))?;
            }

            for s in core::iter::once(&text.name).chain(&text.options) {
                if s.len() > TEXT_CAP {
                    Err(fail(at, Rule::TextTooLong(s.len())))?;
                }
                if let Some(&b) = s.as_bytes().iter().find(|&&b| !PRINTABLE.contains(&b)) {
                    Err(fail(at, Rule::TextNotPrintable(b)))?;
                }
            }
        }

        Ok(())
    }

    fn check_group(&self, group_i: usize, group: &Group) -> Result {
        for (option_i, option) in group.options.iter().enumerate() {
            let at = Location::Choice {
                group: group_i,
                option: option_i,
            };

            self.sprite(at, option.sprite_i, 0)?;
            self.sprite(at, option.sprite_i, 1)?;
            self.clip(at, option.clip_i, group.option_clips.max(1) - 1)?;

            if let Some(writein_i) = option.writein_group_i {
                let writein = self.group(at, writein_i)?;

                if writein.max_chars != 0 {
                    Err(fail(at, Rule::WriteinHasChars(writein_i)))?;
                }
                if writein.max_sels != group.max_chars || group.max_chars == 0 {
                    Err(fail(
                        at,
                        Rule::WriteinCapacity {
                            group: writein_i,
                            max_sels: writein.max_sels,
                            max_chars: group.max_chars,
                        },
                    ))?;
                }
            }
        }

        Ok(())
    }

    fn check_page(&self, page_i: usize, page: &'b Page) -> Result {
        let layout = &self.ballot.video.layouts[page_i];

        if page.states.is_empty() {
            Err(fail(Location::Page(page_i), Rule::NoStates))?;
        }

        let scope = Scope {
            page_i,
            page,
            layout,
            states: 0..page.states.len(),
            action: None,
        };

        for (binding_i, binding) in page.bindings.iter().enumerate() {
            let at = Location::PageBinding {
                page: page_i,
                binding: binding_i,
            };
            self.check_binding(at, &scope, binding)?;
        }

        for (state_i, state) in page.states.iter().enumerate() {
            let at = Location::State {
                page: page_i,
                state: state_i,
            };
            let scope = Scope {
                states: state_i..state_i + 1,
                ..scope.clone()
            };

            self.fits(at, layout, u64::from(state.sprite_i), state_i as u64)?;
            self.check_segments(at, &scope, &state.segments)?;
            for (binding_i, binding) in state.bindings.iter().enumerate() {
                let at = Location::StateBinding {
                    page: page_i,
                    state: state_i,
                    binding: binding_i,
                };
                self.check_binding(at, &scope, binding)?;
            }
            self.check_segments(at, &scope, &state.timeout_segments)?;

            if let Some(page_i) = state.timeout_page_i {
                self.check_goto(at, page_i, state.timeout_state_i)?;
            }
        }

        let mut slot = page.states.len() as u64;

        for (area_i, area) in page.option_areas.iter().enumerate() {
            let at = Location::OptionArea {
                page: page_i,
                area: area_i,
            };
            let group = self.group(at, area.group_i)?;
            let option = self.option(at, group, area.option_i)?;

            self.fits(at, layout, u64::from(option.sprite_i), slot)?;
            self.fits(at, layout, u64::from(option.sprite_i) + 1, slot)?;
            slot += 1;

            if option.writein_group_i.is_some() {
                self.check_chars(at, layout, group, option, slot)?;
                slot += u64::from(group.max_chars);
            }
        }

        for (area_i, area) in page.counter_areas.iter().enumerate() {
            let at = Location::CounterArea {
                page: page_i,
                area: area_i,
            };
            let group = self.group(at, area.group_i)?;

            self.slot(at, layout, slot)?;
            for count in 0..=u64::from(group.max_sels) {
                self.fits(at, layout, u64::from(area.sprite_i) + count, slot)?;
            }
            slot += 1;
        }

        for (area_i, area) in page.review_areas.iter().enumerate() {
            let at = Location::ReviewArea {
                page: page_i,
                area: area_i,
            };
            let group = self.group(at, area.group_i)?;

            for _ in 0..group.max_sels {
                self.slot(at, layout, slot)?;
                for option in &group.options {
                    self.fits(at, layout, u64::from(option.sprite_i), slot)?;
                    if option.writein_group_i.is_some() {
                        self.check_chars(at, layout, group, option, slot + 1)?;
                    }
                }
                if let Some(cursor_i) = area.cursor_sprite_i {
                    self.fits(at, layout, u64::from(cursor_i), slot)?;
                }
                slot += 1 + u64::from(group.max_chars);
            }
        }

        Ok(())
    }

    /// Check the character slots following an option's slot against the
    /// sprites of its write-in group.
    fn check_chars(
        &self,
        at: Location,
        layout: &Layout,
        group: &Group,
        option: &Choice,
        first: u64,
    ) -> Result {
        let Some(writein_i) = option.writein_group_i else {
            return Ok(());
        };
        let writein = self.group(at, writein_i)?;

        for k in 0..u64::from(group.max_chars) {
            self.slot(at, layout, first + k)?;
            for c in &writein.options {
                self.fits(at, layout, u64::from(c.sprite_i), first + k)?;
            }
        }

        Ok(())
    }

    fn check_binding(&self, at: Location, scope: &Scope<'b>, binding: &'b Binding) -> Result {
        if binding.key.is_none() && binding.target_i.is_none() {
            Err(fail(at, Rule::NoTrigger))?;
        }
        if let Some(target_i) = binding.target_i {
            if target_i as usize >= scope.layout.targets.len() {
                Err(fail(at, Rule::TargetOutOfRange(target_i)))?;
            }
        }

        self.check_conditions(at, scope, &binding.conditions)?;
        for step in &binding.steps {
            self.resolve(at, scope, step, step.op != Op::Pop)?;
        }

        let scope = Scope {
            action: binding.steps.first(),
            ..scope.clone()
        };
        self.check_segments(at, &scope, &binding.segments)?;

        if let Some((page_i, state_i)) = binding.next() {
            self.check_goto(at, page_i, state_i)?;
        }

        Ok(())
    }

    fn check_conditions(
        &self,
        at: Location,
        scope: &Scope<'b>,
        conditions: &[Condition],
    ) -> Result {
        for condition in conditions {
            let needs_option = condition.predicate == Predicate::OptionSelected;
            self.resolve(at, scope, condition, needs_option)?;
        }

        Ok(())
    }

    fn check_segments(&self, at: Location, scope: &Scope<'b>, segments: &[Segment]) -> Result {
        for segment in segments {
            self.check_conditions(at, scope, &segment.conditions)?;

            let clip_i = segment.clip_i;

            match segment.kind {
                SegmentKind::Clip => self.clip(at, clip_i, 0)?,
                SegmentKind::Option => {
                    let group = self.resolve(at, scope, segment, true)?;
                    check_offset(at, group, clip_i)?;
                }
                SegmentKind::OptionFlag => {
                    self.resolve(at, scope, segment, true)?;
                    self.clip(at, clip_i, 1)?;
                }
                SegmentKind::StateOption | SegmentKind::StateOptionFlag => {
                    for state_i in scope.states.clone() {
                        let Some(area) = scope.page.option_areas.get(state_i) else {
                            return Err(fail(at, Rule::NoStateOption(state_i)));
                        };
                        let group = self.group(at, area.group_i)?;
                        self.option(at, group, area.option_i)?;

                        if segment.kind == SegmentKind::StateOption {
                            check_offset(at, group, clip_i)?;
                        } else {
                            self.clip(at, clip_i, 1)?;
                        }
                    }
                }
                SegmentKind::ActionOption | SegmentKind::ActionOptionFlag => {
                    let Some(step) = scope.action else {
                        return Err(fail(at, Rule::NoActionOption));
                    };
                    let group = self.resolve(at, scope, step, true)?;

                    if segment.kind == SegmentKind::ActionOption {
                        check_offset(at, group, clip_i)?;
                    } else {
                        self.clip(at, clip_i, 1)?;
                    }
                }
                SegmentKind::Selections => {
                    let group = self.resolve(at, scope, segment, false)?;
                    check_offset(at, group, clip_i)?;
                }
                SegmentKind::SelectionCount | SegmentKind::Capacity => {
                    let group = self.resolve(at, scope, segment, false)?;
                    self.clip(at, clip_i, group.max_sels)?;
                }
            }
        }

        Ok(())
    }

    fn check_goto(&self, at: Location, page_i: u32, state_i: u32) -> Result {
        let page = self
            .ballot
            .model
            .pages
            .get(page_i as usize)
            .ok_or_else(|| fail(at, Rule::PageOutOfRange(page_i)))?;

        if state_i as usize >= page.states.len() {
            Err(fail(at, Rule::StateOutOfRange(state_i)))?;
        }

        Ok(())
    }

    /// Resolve the group an address refers to, directly or through an option
    /// area of the page, checking the option index when it will be used.
    fn resolve(
        &self,
        at: Location,
        scope: &Scope<'b>,
        address: &impl Address,
        needs_option: bool,
    ) -> Result<&'b Group> {
        match address.address() {
            Left((group_i, option_i)) => {
                let group = self.group(at, group_i)?;
                if needs_option {
                    self.option(at, group, option_i)?;
                }
                Ok(group)
            }
            Right(area_i) => {
                let area = scope
                    .page
                    .option_areas
                    .get(area_i as usize)
                    .ok_or_else(|| fail(at, Rule::OptionAreaOutOfRange(area_i)))?;
                let group = self.group(at, area.group_i)?;
                self.option(at, group, area.option_i)?;
                Ok(group)
            }
        }
    }

    fn group(&self, at: Location, group_i: u32) -> Result<&'b Group> {
        self.ballot
            .model
            .groups
            .get(group_i as usize)
            .ok_or_else(|| fail(at, Rule::GroupOutOfRange(group_i)))
    }

    fn option(&self, at: Location, group: &'b Group, option_i: u32) -> Result<&'b Choice> {
        group
            .options
            .get(option_i as usize)
            .ok_or_else(|| fail(at, Rule::OptionOutOfRange(option_i)))
    }

    fn sprite(&self, at: Location, sprite_i: u32, offset: u32) -> Result<&'b Image> {
        let i = u64::from(sprite_i) + u64::from(offset);
        index(&self.ballot.video.sprites, i).ok_or_else(|| fail(at, Rule::SpriteOutOfRange(i)))
    }

    fn clip(&self, at: Location, clip_i: u32, offset: u32) -> Result {
        let i = u64::from(clip_i) + u64::from(offset);
        match index(&self.ballot.audio.clips, i) {
            Some(_) => Ok(()),
            None => Err(fail(at, Rule::ClipOutOfRange(i))),
        }
    }

    fn slot<'l>(&self, at: Location, layout: &'l Layout, slot_i: u64) -> Result<&'l Rect> {
        index(&layout.slots, slot_i).ok_or_else(|| fail(at, Rule::SlotOutOfRange(slot_i)))
    }

    /// Check that a sprite exists and has the size of the slot it is pasted into.
    fn fits(&self, at: Location, layout: &Layout, sprite_i: u64, slot_i: u64) -> Result {
        let slot = self.slot(at, layout, slot_i)?;
        let sprite = index(&self.ballot.video.sprites, sprite_i)
            .ok_or_else(|| fail(at, Rule::SpriteOutOfRange(sprite_i)))?;

        if sprite.size() != slot.size() {
            Err(fail(
                at,
                Rule::SizeMismatch {
                    sprite: sprite_i,
                    slot: slot_i,
                    sprite_size: sprite.size(),
                    slot_size: slot.size(),
                },
            ))?;
        }

        Ok(())
    }
}

fn fail(at: Location, rule: Rule) -> Error {
    Error { at, rule }
}

fn index<T>(items: &[T], i: u64) -> Option<&T> {
    usize::try_from(i).ok().and_then(|i| items.get(i))
}

/// A per-option clip offset must stay within the clips each option owns.
fn check_offset(at: Location, group: &Group, offset: u32) -> Result {
    if offset >= group.option_clips {
        Err(fail(
            at,
            Rule::ClipOffsetOutOfRange {
                offset,
                option_clips: group.option_clips,
            },
        ))?;
    }

    Ok(())
}

fn check_pixels(at: Location, image: &Image) -> Result {
    let expected = u64::from(image.width) * u64::from(image.height) * 3;

    if expected == 0 {
        Err(fail(at, Rule::EmptyImage))?;
    }
    if image.pixels.len() as u64 != expected {
        Err(fail(
            at,
            Rule::PixelLength {
                found: image.pixels.len(),
                width: image.width,
                height: image.height,
            },
        ))?;
    }

    Ok(())
}
