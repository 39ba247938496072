use clarityvote_client::normalize::{DEFAULT_CREATOR, DEFAULT_TITLE};
use clarityvote_client::{normalize_option, normalize_poll, PollStatus, RawValue};
use proptest::prelude::*;

const POLL_FIELDS: [&str; 7] = [
    "creator",
    "title",
    "option-count",
    "deadline",
    "is-closed",
    "total-votes",
    "created-at",
];

fn wrap(mut raw: RawValue, times: usize) -> RawValue {
    for _ in 0..times {
        raw = RawValue::envelope("(optional (tuple))", raw);
    }
    raw
}

fn text_field(value: &str) -> RawValue {
    RawValue::envelope("(string-ascii 64)", RawValue::Text(value.to_string()))
}

fn uint_field(value: u64) -> RawValue {
    RawValue::envelope("uint", RawValue::Text(value.to_string()))
}

fn poll_record(
    title: &str,
    option_count: u64,
    deadline: u64,
    is_closed: bool,
    total_votes: u64,
    skip: Option<usize>,
) -> RawValue {
    let values = [
        text_field("ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"),
        text_field(title),
        uint_field(option_count),
        uint_field(deadline),
        RawValue::envelope("bool", RawValue::Bool(is_closed)),
        uint_field(total_votes),
        uint_field(1_700_000_000),
    ];
    RawValue::record(
        POLL_FIELDS
            .iter()
            .zip(values)
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, (name, value))| (*name, value)),
    )
}

proptest! {
    #[test]
    fn test_poll_wrapping_is_transparent(
        title in "[a-zA-Z0-9 ?]{1,40}",
        option_count in 2u64..=10,
        deadline in any::<u64>(),
        is_closed in any::<bool>(),
        total_votes in any::<u64>(),
        depth in 0usize..=8,
    ) {
        let bare = normalize_poll(9, &poll_record(&title, option_count, deadline, is_closed, total_votes, None));
        let wrapped = normalize_poll(
            9,
            &wrap(poll_record(&title, option_count, deadline, is_closed, total_votes, None), depth),
        );
        prop_assert_eq!(&bare, &wrapped);
        prop_assert_eq!(bare.title, title);
        prop_assert_eq!(bare.option_count, option_count);
        prop_assert_eq!(bare.deadline, deadline);
        prop_assert_eq!(bare.is_closed, is_closed);
        prop_assert_eq!(bare.total_votes, total_votes);
    }

    #[test]
    fn test_option_wrapping_is_transparent(
        text in "[a-zA-Z ]{1,30}",
        votes in any::<u64>(),
        depth in 0usize..=8,
    ) {
        let record = RawValue::record([
            ("text", text_field(&text)),
            ("vote-count", uint_field(votes)),
        ]);
        let option = normalize_option(1, &wrap(record, depth));
        prop_assert_eq!(option.option_index, 1);
        prop_assert_eq!(option.text, text);
        prop_assert_eq!(option.vote_count, votes);
    }

    #[test]
    fn test_missing_poll_field_takes_default(
        skip in 0usize..POLL_FIELDS.len(),
        depth in 0usize..=3,
    ) {
        let poll = normalize_poll(1, &wrap(poll_record("Lunch", 3, 500, true, 7, Some(skip)), depth));
        match POLL_FIELDS[skip] {
            "creator" => prop_assert_eq!(poll.creator.as_str(), DEFAULT_CREATOR),
            "title" => prop_assert_eq!(poll.title.as_str(), DEFAULT_TITLE),
            "option-count" => prop_assert_eq!(poll.option_count, 0),
            "deadline" => prop_assert_eq!(poll.deadline, 0),
            "is-closed" => prop_assert!(!poll.is_closed),
            "total-votes" => prop_assert_eq!(poll.total_votes, 0),
            "created-at" => prop_assert_eq!(poll.created_at, 0),
            other => prop_assert!(false, "unhandled field {}", other),
        }
        prop_assert_eq!(poll.poll_id, 1);
    }

    #[test]
    fn test_status_truth_table(
        is_closed in any::<bool>(),
        deadline in any::<u64>(),
        now in any::<u64>(),
    ) {
        let status = PollStatus::classify(is_closed, deadline, now);
        let expected = if is_closed {
            PollStatus::Closed
        } else if now >= deadline {
            PollStatus::Expired
        } else {
            PollStatus::Active
        };
        prop_assert_eq!(status, expected);
        prop_assert_eq!(status.accepts_votes(), !is_closed && now < deadline);
    }
}

#[test]
fn test_null_response_is_all_defaults() {
    let poll = normalize_poll(4, &wrap(RawValue::Null, 2));
    assert_eq!(poll.poll_id, 4);
    assert_eq!(poll.creator, DEFAULT_CREATOR);
    assert_eq!(poll.title, DEFAULT_TITLE);
    assert_eq!(poll.total_votes, 0);
    assert!(!poll.is_closed);
}
