#![allow(dead_code)]

//! In-memory ballots shared by the integration tests.
//!
//! Every sprite and slot is 2x1 pixels on an 8x8 canvas, so any sprite fits any
//! slot. Every clip holds a single sample.

use kiosk_ballot::ballot::*;

pub const TIMEOUT_MS: u32 = 10_000;

pub fn image(width: u32, height: u32) -> Image {
    Image {
        width,
        height,
        pixels: vec![0x80; (width * height * 3) as usize],
    }
}

pub fn slot() -> Rect {
    Rect {
        left: 0,
        top: 0,
        width: 2,
        height: 1,
    }
}

pub fn clip() -> Clip {
    Clip {
        samples: vec![0, 0],
    }
}

pub fn layout(targets: Vec<Rect>, slots: usize) -> Layout {
    Layout {
        screen: image(8, 8),
        targets,
        slots: vec![slot(); slots],
    }
}

pub fn choice(sprite_i: u32, clip_i: u32) -> Choice {
    Choice {
        sprite_i,
        clip_i,
        writein_group_i: None,
    }
}

pub fn group(max_sels: u32, options: Vec<Choice>) -> Group {
    Group {
        max_sels,
        max_chars: 0,
        option_clips: 1,
        options,
    }
}

pub fn text(name: &str, options: &[&str]) -> TextGroup {
    TextGroup {
        name: name.to_string(),
        writein: false,
        options: options.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn state(sprite_i: u32, segments: Vec<Segment>) -> State {
    State {
        sprite_i,
        segments,
        bindings: vec![],
        timeout_segments: vec![],
        timeout_page_i: None,
        timeout_state_i: 0,
    }
}

pub fn segment(kind: SegmentKind, clip_i: u32, group_i: Option<u32>, option_i: u32) -> Segment {
    Segment {
        conditions: vec![],
        kind,
        clip_i,
        group_i,
        option_i,
    }
}

pub fn play(clip_i: u32) -> Segment {
    segment(SegmentKind::Clip, clip_i, None, 0)
}

pub fn step(op: Op, group_i: Option<u32>, option_i: u32) -> Step {
    Step {
        op,
        group_i,
        option_i,
    }
}

pub fn condition(
    predicate: Predicate,
    group_i: Option<u32>,
    option_i: u32,
    invert: bool,
) -> Condition {
    Condition {
        predicate,
        group_i,
        option_i,
        invert,
    }
}

pub fn key(key: u32, steps: Vec<Step>, segments: Vec<Segment>) -> Binding {
    Binding {
        key: Some(key),
        target_i: None,
        conditions: vec![],
        steps,
        segments,
        next_page_i: None,
        next_state_i: 0,
    }
}

pub fn goto(key_: u32, page_i: u32, state_i: u32) -> Binding {
    Binding {
        next_page_i: Some(page_i),
        next_state_i: state_i,
        ..key(key_, vec![], vec![])
    }
}

/// One group with one option, one page with one state.
pub fn minimal() -> Ballot {
    Ballot {
        model: Model {
            groups: vec![group(1, vec![choice(0, 0)])],
            pages: vec![Page {
                bindings: vec![],
                states: vec![state(0, vec![])],
                option_areas: vec![],
                counter_areas: vec![],
                review_areas: vec![],
            }],
            timeout_ms: TIMEOUT_MS,
        },
        text: TextCatalog {
            groups: vec![text("Mayor", &["Alice"])],
        },
        audio: Audio {
            sample_rate: 8000,
            clips: vec![clip()],
        },
        video: Video {
            width: 8,
            height: 8,
            layouts: vec![layout(vec![], 1)],
            sprites: vec![image(2, 1), image(2, 1)],
        },
    }
}

/// A two-page ballot exercising every feature of the navigator.
///
/// Groups:
/// - 0: pick one of two (sprites 0 and 2, clips 10 and 11)
/// - 1: up to three, repeats allowed (sprites 4 and 6, clips 12 and 13)
/// - 2: a single write-in option (sprite 15, clip 14) of up to two characters
/// - 3: the write-in alphabet, `A` (sprite 17, clip 15) and `B` (sprite 19,
///   clip 16)
///
/// Page 0 slots: states 0-1, option areas 2-4 with write-in characters 5-6,
/// counter 7, review of group 0 at 8, review of group 2 at 9 with characters
/// 10-11.
///
/// Page 0 keys:
/// - 1, 2: select option 1, 0 of group 0
/// - 3: toggle option 1 of group 0
/// - 4: append option 0 to group 1
/// - 5: to state 1 if group 0 has a selection, else play clip 4
/// - 7: clip 2 from state 0, clip 3 from state 1
/// - 9: to page 1
/// - 11, 12: type `A`, `B`; 13: erase
/// - 14: select the write-in
/// - 15: read out the write-in selections
/// - 16: read out group 1's count and capacity
///
/// Page 0 target 0 toggles option area 0 and reads back its flag.
pub fn kiosk() -> Ballot {
    let writein = Group {
        max_sels: 1,
        max_chars: 2,
        option_clips: 1,
        options: vec![Choice {
            sprite_i: 15,
            clip_i: 14,
            writein_group_i: Some(3),
        }],
    };

    let mut state0 = state(8, vec![play(0), segment(SegmentKind::StateOption, 0, None, 0)]);
    state0.bindings = vec![key(7, vec![], vec![play(2)])];
    state0.timeout_segments = vec![play(1)];

    let mut state1 = state(9, vec![]);
    state1.timeout_page_i = Some(0);

    let to_state1 = Binding {
        conditions: vec![condition(Predicate::GroupEmpty, Some(0), 0, true)],
        ..goto(5, 0, 1)
    };

    let toggle_area = Binding {
        key: None,
        target_i: Some(0),
        ..key(
            0,
            vec![step(Op::Toggle, None, 0)],
            vec![segment(SegmentKind::ActionOptionFlag, 5, None, 0)],
        )
    };

    let page0 = Page {
        bindings: vec![
            key(1, vec![step(Op::Select, Some(0), 1)], vec![]),
            key(2, vec![step(Op::Select, Some(0), 0)], vec![]),
            key(3, vec![step(Op::Toggle, Some(0), 1)], vec![]),
            key(4, vec![step(Op::Append, Some(1), 0)], vec![]),
            to_state1,
            key(5, vec![], vec![play(4)]),
            key(7, vec![], vec![play(3)]),
            goto(9, 1, 0),
            key(11, vec![step(Op::Append, Some(3), 0)], vec![]),
            key(12, vec![step(Op::Append, Some(3), 1)], vec![]),
            key(13, vec![step(Op::Pop, Some(3), 0)], vec![]),
            key(14, vec![step(Op::Select, Some(2), 0)], vec![]),
            key(
                15,
                vec![],
                vec![segment(SegmentKind::Selections, 0, Some(2), 0)],
            ),
            key(
                16,
                vec![],
                vec![
                    segment(SegmentKind::SelectionCount, 0, Some(1), 0),
                    segment(SegmentKind::Capacity, 5, Some(1), 0),
                ],
            ),
            toggle_area,
        ],
        states: vec![state0, state1],
        option_areas: vec![
            OptionArea {
                group_i: 0,
                option_i: 0,
            },
            OptionArea {
                group_i: 0,
                option_i: 1,
            },
            OptionArea {
                group_i: 2,
                option_i: 0,
            },
        ],
        counter_areas: vec![CounterArea {
            group_i: 1,
            sprite_i: 10,
        }],
        review_areas: vec![
            ReviewArea {
                group_i: 0,
                cursor_sprite_i: Some(14),
            },
            ReviewArea {
                group_i: 2,
                cursor_sprite_i: None,
            },
        ],
    };

    let mut closing = state(8, vec![play(4)]);
    closing.bindings = vec![goto(8, 0, 0)];

    let page1 = Page {
        bindings: vec![],
        states: vec![closing],
        option_areas: vec![],
        counter_areas: vec![],
        review_areas: vec![],
    };

    let targets = vec![
        Rect {
            left: 0,
            top: 0,
            width: 4,
            height: 4,
        },
        Rect {
            left: 4,
            top: 4,
            width: 4,
            height: 4,
        },
    ];

    Ballot {
        model: Model {
            groups: vec![
                group(1, vec![choice(0, 10), choice(2, 11)]),
                group(3, vec![choice(4, 12), choice(6, 13)]),
                writein,
                group(2, vec![choice(17, 15), choice(19, 16)]),
            ],
            pages: vec![page0, page1],
            timeout_ms: TIMEOUT_MS,
        },
        text: TextCatalog {
            groups: vec![
                text("Mayor", &["Alice", "Bob"]),
                text("Measures", &["Yes", "No"]),
                TextGroup {
                    writein: true,
                    ..text("Write-in", &["Write-in"])
                },
                text("Letters", &["A", "B"]),
            ],
        },
        audio: Audio {
            sample_rate: 8000,
            clips: vec![clip(); 20],
        },
        video: Video {
            width: 8,
            height: 8,
            layouts: vec![layout(targets, 12), layout(vec![], 1)],
            sprites: vec![image(2, 1); 21],
        },
    }
}
