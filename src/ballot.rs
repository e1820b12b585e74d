//! In-memory ballot definition.
//!
//! A [`Ballot`] is produced once by a loader and never mutated afterward. Every
//! cross-reference inside it is a plain integer index into a sibling
//! collection. References that may be absent are `Option<u32>`, mapping the
//! null sentinel of the encoding.
//!
//! Several records address an option either directly, by group and option
//! index, or indirectly through one of the current page's option areas. See
//! [`Address`].

use alloc::{string::String, vec::Vec};
use core::fmt;

use either::Either::{self, Left, Right};

use crate::wire::{self, Source, Wire, read_enum, read_raw};

/// A complete ballot definition: everything between the header and digest.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Ballot {
    pub model: Model,
    pub text: TextCatalog,
    pub audio: Audio,
    pub video: Video,
}

/// The interactive structure driving a voting session.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Model {
    pub groups: Vec<Group>,
    pub pages: Vec<Page>,
    /// Idle time before a state's timeout fires, in milliseconds.
    pub timeout_ms: u32,
}

/// A contest, or the alphabet of a write-in.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Group {
    /// Capacity of the group's selection list.
    pub max_sels: u32,
    /// Characters permitted in a write-in hosted by this group.
    pub max_chars: u32,
    /// Number of consecutive clips each option owns.
    pub option_clips: u32,
    pub options: Vec<Choice>,
}

/// An option within a group.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Choice {
    /// Unselected image; the selected image follows it.
    pub sprite_i: u32,
    /// First of the option's clips.
    pub clip_i: u32,
    /// Group collecting the characters of this option's write-in.
    pub writein_group_i: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Page {
    pub bindings: Vec<Binding>,
    pub states: Vec<State>,
    pub option_areas: Vec<OptionArea>,
    pub counter_areas: Vec<CounterArea>,
    pub review_areas: Vec<ReviewArea>,
}

/// A focus position within a page.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct State {
    /// Pasted into the slot sharing the state's index.
    pub sprite_i: u32,
    /// Played on entry.
    pub segments: Vec<Segment>,
    /// Consulted before the page's bindings.
    pub bindings: Vec<Binding>,
    pub timeout_segments: Vec<Segment>,
    /// Target of the timeout; null means page 0, state 0.
    pub timeout_page_i: Option<u32>,
    pub timeout_state_i: u32,
}

impl State {
    /// Page and state entered when this state times out.
    pub fn timeout_target(&self) -> (u32, u32) {
        match self.timeout_page_i {
            Some(page_i) => (page_i, self.timeout_state_i),
            None => (0, 0),
        }
    }
}

/// An input rule, triggered by a key or a touch target.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Binding {
    pub key: Option<u32>,
    pub target_i: Option<u32>,
    pub conditions: Vec<Condition>,
    pub steps: Vec<Step>,
    pub segments: Vec<Segment>,
    pub next_page_i: Option<u32>,
    pub next_state_i: u32,
}

impl Binding {
    /// Page and state entered after this binding runs, if any.
    pub fn next(&self) -> Option<(u32, u32)> {
        self.next_page_i.map(|page_i| (page_i, self.next_state_i))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Condition {
    pub predicate: Predicate,
    pub group_i: Option<u32>,
    pub option_i: u32,
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Step {
    pub op: Op,
    pub group_i: Option<u32>,
    pub option_i: u32,
}

/// One unit of audio feedback.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Segment {
    pub conditions: Vec<Condition>,
    pub kind: SegmentKind,
    pub clip_i: u32,
    pub group_i: Option<u32>,
    pub option_i: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct OptionArea {
    pub group_i: u32,
    pub option_i: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct CounterArea {
    pub group_i: u32,
    /// Image for an empty group; one more follows per selection.
    pub sprite_i: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct ReviewArea {
    pub group_i: u32,
    pub cursor_sprite_i: Option<u32>,
}

/// How a condition, step or segment locates its option.
pub trait Address {
    fn group_i(&self) -> Option<u32>;
    fn option_i(&self) -> u32;

    /// A direct group and option pair, or the index of an option area on the
    /// current page.
    fn address(&self) -> Either<(u32, u32), u32> {
        match self.group_i() {
            Some(group_i) => Left((group_i, self.option_i())),
            None => Right(self.option_i()),
        }
    }
}

macro_rules! address {
    ($($t:ident),*) => {
        $(
            impl Address for $t {
                fn group_i(&self) -> Option<u32> {
                    self.group_i
                }

                fn option_i(&self) -> u32 {
                    self.option_i
                }
            }
        )*
    };
}

address!(Condition, Step, Segment);

macro_rules! wire_enum {
    ($(#[$attr:meta])* $t:ident { $($(#[$v_attr:meta])* $v:ident = $n:literal => $name:literal,)* }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $t {
            $($(#[$v_attr])* $v = $n,)*
        }

        impl $t {
            /// Number of encodable values.
            pub const CARDINALITY: u32 = [$($n),*].len() as u32;

            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($n => Some(Self::$v),)*
                    _ => None,
                }
            }
        }

        impl Wire for $t {
            fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
                let value = read_enum(s, Self::CARDINALITY)?;
                match Self::from_u32(value) {
                    Some(v) => Ok(v),
                    None => unreachable!(),
                }
            }

            fn encode(&self, w: &mut Vec<u8>) {
                wire::write_u32(w, Some(*self as u32));
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$v => $name,)*
                })
            }
        }
    };
}

wire_enum!(
    /// Test applied by a [`Condition`].
    Predicate {
        /// The group has no selections.
        GroupEmpty = 0 => "group-empty",
        /// The group holds `max_sels` selections.
        GroupFull = 1 => "group-full",
        /// The option is in the group's selections.
        OptionSelected = 2 => "option-selected",
    }
);

wire_enum!(
    /// Selection operation applied by a [`Step`].
    Op {
        Select = 0 => "select",
        Deselect = 1 => "deselect",
        Toggle = 2 => "toggle",
        /// Append without checking for presence.
        Append = 3 => "append",
        /// Append, reporting when the list was empty beforehand.
        AppendGuarded = 4 => "append-guarded",
        /// Remove the most recently appended selection.
        Pop = 5 => "pop",
    }
);

wire_enum!(
    /// How a [`Segment`] chooses its clip.
    SegmentKind {
        /// `clip_i` itself.
        Clip = 0 => "clip",
        /// Offset into the clips of an addressed option.
        Option = 1 => "option",
        /// Offset into the clips of the state's option.
        StateOption = 2 => "state-option",
        /// Offset into the clips of the action's option.
        ActionOption = 3 => "action-option",
        /// `clip_i`, plus one if an addressed option is selected.
        OptionFlag = 4 => "option-flag",
        /// `clip_i`, plus one if the state's option is selected.
        StateOptionFlag = 5 => "state-option-flag",
        /// `clip_i`, plus one if the action's option is selected.
        ActionOptionFlag = 6 => "action-option-flag",
        /// Offset into the clips of every selected option in a group.
        Selections = 7 => "selections",
        /// `clip_i` plus the number of selections in a group.
        SelectionCount = 8 => "selection-count",
        /// `clip_i` plus the capacity of a group.
        Capacity = 9 => "capacity",
    }
);

/// Display strings for each group, parallel to [`Model::groups`].
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct TextCatalog {
    pub groups: Vec<TextGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct TextGroup {
    pub name: String,
    pub writein: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Audio {
    pub sample_rate: u32,
    pub clips: Vec<Clip>,
}

/// Sixteen-bit PCM samples, as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub samples: Vec<u8>,
}

impl Wire for Clip {
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
        let count = u32::decode(s)?;
        let samples = read_raw(s, count, 2)?;
        Ok(Self { samples })
    }

    fn encode(&self, w: &mut Vec<u8>) {
        ((self.samples.len() / 2) as u32).encode(w);
        w.extend_from_slice(&self.samples);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Video {
    pub width: u32,
    pub height: u32,
    /// One per page, in page order.
    pub layouts: Vec<Layout>,
    pub sprites: Vec<Image>,
}

/// The screen for a page, with its touch targets and sprite slots.
#[derive(Debug, Clone, PartialEq, Eq, Wire)]
pub struct Layout {
    pub screen: Image,
    pub targets: Vec<Rect>,
    pub slots: Vec<Rect>,
}

impl Layout {
    /// Find the first target containing a point.
    pub fn locate(&self, x: u32, y: u32) -> Option<u32> {
        self.targets
            .iter()
            .position(|t| t.contains(x, y))
            .map(|i| i as u32)
    }
}

/// An RGB image, three bytes per pixel in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Wire for Image {
    fn decode<S: Source>(s: &mut S) -> Result<Self, S::Error> {
        let width = u32::decode(s)?;
        let height = u32::decode(s)?;
        let area = width.checked_mul(height).ok_or(wire::Error::Oversize)?;
        let pixels = read_raw(s, area, 3)?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    fn encode(&self, w: &mut Vec<u8>) {
        self.width.encode(w);
        self.height.encode(w);
        w.extend_from_slice(&self.pixels);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Wire)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (x, y) = (u64::from(x), u64::from(y));
        let (left, top) = (u64::from(self.left), u64::from(self.top));

        left <= x
            && x < left + u64::from(self.width)
            && top <= y
            && y < top + u64::from(self.height)
    }
}
