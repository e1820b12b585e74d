mod common;

use kiosk_ballot::{
    Ballot, Verified,
    ballot::*,
    verify::{Error, Location, Rule, verify},
};

use common::*;

fn rejects(ballot: &Ballot, at: Location, rule: Rule) {
    assert_eq!(verify(ballot), Err(Error { at, rule }));
    assert!(Verified::new(ballot).is_err());
}

const STATE: Location = Location::State { page: 0, state: 0 };

const BINDING: Location = Location::PageBinding {
    page: 0,
    binding: 0,
};

#[test]
fn accepts_fixtures() {
    assert_eq!(verify(&minimal()), Ok(()));
    assert_eq!(verify(&kiosk()), Ok(()));

    let ballot = kiosk();
    let verified = Verified::new(&ballot).unwrap();
    assert!(core::ptr::eq(verified.ballot(), &ballot));
}

#[test]
fn structure() {
    let mut ballot = minimal();
    ballot.model.groups.clear();
    rejects(&ballot, Location::Ballot, Rule::NoGroups);

    let mut ballot = minimal();
    ballot.model.pages.clear();
    rejects(&ballot, Location::Ballot, Rule::NoPages);

    let mut ballot = minimal();
    ballot.model.pages[0].states.clear();
    rejects(&ballot, Location::Page(0), Rule::NoStates);

    let mut ballot = minimal();
    ballot.video.layouts.push(layout(vec![], 1));
    rejects(
        &ballot,
        Location::Ballot,
        Rule::LayoutCount {
            layouts: 2,
            pages: 1,
        },
    );
}

#[test]
fn text() {
    let mut ballot = minimal();
    ballot.text.groups.push(common::text("Sheriff", &[]));
    rejects(
        &ballot,
        Location::Ballot,
        Rule::TextGroupCount { text: 2, groups: 1 },
    );

    let mut ballot = minimal();
    ballot.text.groups[0].options.push("Bob".to_string());
    rejects(
        &ballot,
        Location::TextGroup(0),
        Rule::TextOptionCount {
            text: 2,
            options: 1,
        },
    );

    let mut ballot = minimal();
    ballot.text.groups[0].name = "x".repeat(51);
    rejects(&ballot, Location::TextGroup(0), Rule::TextTooLong(51));

    let mut ballot = minimal();
    ballot.text.groups[0].options[0] = "Al\tice".to_string();
    rejects(&ballot, Location::TextGroup(0), Rule::TextNotPrintable(b'\t'));
}

#[test]
fn media() {
    let mut ballot = minimal();
    ballot.audio.clips[0].samples.clear();
    rejects(&ballot, Location::Clip(0), Rule::EmptyClip);

    let mut ballot = minimal();
    ballot.audio.clips[0].samples.push(0);
    rejects(&ballot, Location::Clip(0), Rule::PartialSample);

    let mut ballot = minimal();
    ballot.video.sprites[1].pixels.pop();
    rejects(
        &ballot,
        Location::Sprite(1),
        Rule::PixelLength {
            found: 5,
            width: 2,
            height: 1,
        },
    );

    let mut ballot = minimal();
    ballot.video.sprites[0] = image(0, 1);
    rejects(&ballot, Location::Sprite(0), Rule::EmptyImage);

    let mut ballot = minimal();
    ballot.video.width = 0;
    rejects(&ballot, Location::Video, Rule::EmptyCanvas);
}

#[test]
fn geometry() {
    let mut ballot = minimal();
    ballot.video.layouts[0].screen = image(4, 4);
    rejects(
        &ballot,
        Location::Layout(0),
        Rule::ScreenSize {
            found: (4, 4),
            canvas: (8, 8),
        },
    );

    let mut ballot = minimal();
    let rect = Rect {
        left: 7,
        top: 0,
        width: 2,
        height: 1,
    };
    ballot.video.layouts[0].slots.push(rect);
    rejects(&ballot, Location::Layout(0), Rule::RectOutsideCanvas(rect));

    let mut ballot = minimal();
    ballot.video.sprites[0] = image(3, 1);
    rejects(
        &ballot,
        STATE,
        Rule::SizeMismatch {
            sprite: 0,
            slot: 0,
            sprite_size: (3, 1),
            slot_size: (2, 1),
        },
    );

    // Every state shows a sprite.
    let mut ballot = minimal();
    ballot.model.pages[0].states[0].sprite_i = 2;
    rejects(&ballot, STATE, Rule::SpriteOutOfRange(2));

    // A second state needs a second slot.
    let mut ballot = minimal();
    let mut second = state(0, vec![]);
    second.timeout_page_i = Some(0);
    ballot.model.pages[0].states.push(second);
    rejects(
        &ballot,
        Location::State { page: 0, state: 1 },
        Rule::SlotOutOfRange(1),
    );
}

#[test]
fn bindings() {
    let mut ballot = minimal();
    ballot.model.pages[0].bindings.push(goto(1, 1, 0));
    rejects(&ballot, BINDING, Rule::PageOutOfRange(1));

    let mut ballot = minimal();
    ballot.model.pages[0].bindings.push(goto(1, 0, 3));
    rejects(&ballot, BINDING, Rule::StateOutOfRange(3));

    let mut ballot = minimal();
    let mut binding = key(1, vec![], vec![]);
    binding.key = None;
    ballot.model.pages[0].bindings.push(binding);
    rejects(&ballot, BINDING, Rule::NoTrigger);

    let mut ballot = minimal();
    let mut binding = key(1, vec![], vec![]);
    binding.target_i = Some(0);
    ballot.model.pages[0].bindings.push(binding);
    rejects(&ballot, BINDING, Rule::TargetOutOfRange(0));

    let mut ballot = minimal();
    let mut timing_out = state(0, vec![]);
    timing_out.timeout_page_i = Some(2);
    ballot.model.pages[0].states[0] = timing_out;
    rejects(&ballot, STATE, Rule::PageOutOfRange(2));
}

#[test]
fn addresses() {
    let mut ballot = minimal();
    let binding = key(1, vec![step(Op::Select, Some(4), 0)], vec![]);
    ballot.model.pages[0].bindings.push(binding);
    rejects(&ballot, BINDING, Rule::GroupOutOfRange(4));

    let mut ballot = minimal();
    let binding = key(1, vec![step(Op::Toggle, Some(0), 1)], vec![]);
    ballot.model.pages[0].bindings.push(binding);
    rejects(&ballot, BINDING, Rule::OptionOutOfRange(1));

    // Pop ignores the option.
    let mut ballot = minimal();
    let binding = key(1, vec![step(Op::Pop, Some(0), 1)], vec![]);
    ballot.model.pages[0].bindings.push(binding);
    assert_eq!(verify(&ballot), Ok(()));

    // Without a group, the option names an option area.
    let mut ballot = minimal();
    let binding = key(1, vec![step(Op::Select, None, 2)], vec![]);
    ballot.model.pages[0].bindings.push(binding);
    rejects(&ballot, BINDING, Rule::OptionAreaOutOfRange(2));

    // Only option predicates need an option.
    let mut ballot = minimal();
    let mut binding = key(1, vec![], vec![]);
    binding.conditions = vec![condition(Predicate::GroupFull, Some(0), 9, false)];
    ballot.model.pages[0].bindings.push(binding);
    assert_eq!(verify(&ballot), Ok(()));
    ballot.model.pages[0].bindings[0].conditions[0].predicate = Predicate::OptionSelected;
    rejects(&ballot, BINDING, Rule::OptionOutOfRange(9));
}

#[test]
fn segments() {
    let with_segment = |segment| {
        let mut ballot = minimal();
        ballot.model.pages[0].states[0].segments.push(segment);
        ballot
    };

    let ballot = with_segment(play(1));
    rejects(&ballot, STATE, Rule::ClipOutOfRange(1));

    let ballot = with_segment(segment(SegmentKind::Option, 1, Some(0), 0));
    rejects(
        &ballot,
        STATE,
        Rule::ClipOffsetOutOfRange {
            offset: 1,
            option_clips: 1,
        },
    );

    let ballot = with_segment(segment(SegmentKind::OptionFlag, 0, Some(0), 0));
    rejects(&ballot, STATE, Rule::ClipOutOfRange(1));

    let ballot = with_segment(segment(SegmentKind::SelectionCount, 0, Some(0), 0));
    rejects(&ballot, STATE, Rule::ClipOutOfRange(1));

    let ballot = with_segment(segment(SegmentKind::StateOption, 0, None, 0));
    rejects(&ballot, STATE, Rule::NoStateOption(0));

    let ballot = with_segment(segment(SegmentKind::ActionOption, 0, None, 0));
    rejects(&ballot, STATE, Rule::NoActionOption);

    // A binding without steps has no action option either.
    let mut ballot = minimal();
    let flag = segment(SegmentKind::ActionOptionFlag, 0, None, 0);
    ballot.model.pages[0].bindings.push(key(1, vec![], vec![flag]));
    rejects(&ballot, BINDING, Rule::NoActionOption);

    // Page bindings run in every state, so each needs its option area.
    let mut ballot = kiosk();
    let read_state = segment(SegmentKind::StateOption, 0, None, 0);
    ballot.model.pages[0].bindings[0].segments.push(read_state);
    assert_eq!(verify(&ballot), Ok(()));
    ballot.model.pages[0].option_areas.truncate(1);
    rejects(&ballot, BINDING, Rule::NoStateOption(1));
}

#[test]
fn options() {
    let mut ballot = minimal();
    ballot.model.groups[0].options[0].clip_i = 1;
    rejects(
        &ballot,
        Location::Choice {
            group: 0,
            option: 0,
        },
        Rule::ClipOutOfRange(1),
    );

    let mut ballot = minimal();
    ballot.model.groups[0].options[0].sprite_i = 1;
    rejects(
        &ballot,
        Location::Choice {
            group: 0,
            option: 0,
        },
        Rule::SpriteOutOfRange(2),
    );
}

#[test]
fn writein_shape() {
    let host = Location::Choice {
        group: 2,
        option: 0,
    };

    let mut ballot = kiosk();
    ballot.model.groups[3].max_sels = 3;
    rejects(
        &ballot,
        host,
        Rule::WriteinCapacity {
            group: 3,
            max_sels: 3,
            max_chars: 2,
        },
    );

    let mut ballot = kiosk();
    ballot.model.groups[3].max_chars = 1;
    rejects(&ballot, host, Rule::WriteinHasChars(3));

    let mut ballot = kiosk();
    ballot.model.groups[2].options[0].writein_group_i = Some(7);
    rejects(&ballot, host, Rule::GroupOutOfRange(7));
}

#[test]
fn areas() {
    let mut ballot = kiosk();
    ballot.model.pages[0].counter_areas[0].sprite_i = 18;
    rejects(
        &ballot,
        Location::CounterArea { page: 0, area: 0 },
        Rule::SpriteOutOfRange(21),
    );

    let mut ballot = kiosk();
    ballot.video.layouts[0].slots.pop();
    rejects(
        &ballot,
        Location::ReviewArea { page: 0, area: 1 },
        Rule::SlotOutOfRange(11),
    );

    let mut ballot = kiosk();
    ballot.model.pages[0].option_areas[2].option_i = 1;
    rejects(
        &ballot,
        Location::OptionArea { page: 0, area: 2 },
        Rule::OptionOutOfRange(1),
    );

    let mut ballot = kiosk();
    ballot.video.sprites[14] = image(1, 2);
    rejects(
        &ballot,
        Location::ReviewArea { page: 0, area: 0 },
        Rule::SizeMismatch {
            sprite: 14,
            slot: 8,
            sprite_size: (1, 2),
            slot_size: (2, 1),
        },
    );
}

#[test]
fn error_messages() {
    let err = Error {
        at: Location::StateBinding {
            page: 1,
            state: 2,
            binding: 3,
        },
        rule: Rule::ClipOutOfRange(40),
    };
    assert_eq!(err.to_string(), "page 1 state 2 binding 3: clip 40 out of range");
}
