use serde::{Deserialize, Serialize};

use crate::types::{Poll, PollOption};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTally {
    /// On-chain option index, taken from the fetched option.
    pub option_index: u64,
    pub label: String,
    pub votes: u64,
    /// Share of `total_votes`, rounded half up; 0 when nobody voted.
    pub percentage: u64,
}

pub fn tally(poll: &Poll, options: &[PollOption]) -> Vec<OptionTally> {
    let total = poll.total_votes as u128;
    options
        .iter()
        .map(|option| {
            let label = if option.text.is_empty() {
                format!("Option {}", option.option_index.saturating_add(1))
            } else {
                option.text.clone()
            };
            let percentage = if total == 0 {
                0
            } else {
                let votes = option.vote_count as u128;
                ((votes * 200 + total) / (total * 2)) as u64
            };
            OptionTally {
                option_index: option.option_index,
                label,
                votes: option.vote_count,
                percentage,
            }
        })
        .collect()
}

/// Every option tied at the top count; empty when no option has a vote.
pub fn winners(tallies: &[OptionTally]) -> Vec<&OptionTally> {
    let max = tallies.iter().map(|t| t.votes).max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    tallies.iter().filter(|t| t.votes == max).collect()
}

/// `ST1PQHQK...GZGM` style abbreviation for display.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(total_votes: u64) -> Poll {
        Poll {
            poll_id: 1,
            creator: "ST1CREATOR".into(),
            title: "Lunch".into(),
            option_count: 3,
            deadline: 0,
            is_closed: false,
            total_votes,
            created_at: 0,
        }
    }

    fn option(option_index: u64, text: &str, vote_count: u64) -> PollOption {
        PollOption {
            option_index,
            text: text.into(),
            vote_count,
        }
    }

    #[test]
    fn test_percentages_round_half_up() {
        let options = vec![option(0, "A", 1), option(1, "B", 1), option(2, "", 6)];
        let tallies = tally(&poll(8), &options);
        assert_eq!(tallies[0].percentage, 13, "12.5 rounds up");
        assert_eq!(tallies[1].percentage, 13);
        assert_eq!(tallies[2].percentage, 75);
        assert_eq!(tallies[2].label, "Option 3");
    }

    #[test]
    fn test_zero_total_gives_zero_percent() {
        let tallies = tally(&poll(0), &[option(0, "A", 0), option(1, "B", 0)]);
        assert!(tallies.iter().all(|t| t.percentage == 0));
        assert!(winners(&tallies).is_empty(), "no winner without votes");
    }

    #[test]
    fn test_ties_are_all_winners() {
        let tallies = tally(&poll(6), &[option(0, "A", 3), option(1, "B", 0), option(2, "C", 3)]);
        let top: Vec<&str> = winners(&tallies).iter().map(|t| t.label.as_str()).collect();
        assert_eq!(top, vec!["A", "C"]);
    }

    #[test]
    fn test_gap_keeps_on_chain_index() {
        // option 1 failed to load
        let tallies = tally(&poll(5), &[option(0, "Tacos", 3), option(2, "", 2)]);
        let indexed: Vec<(u64, &str)> = tallies
            .iter()
            .map(|t| (t.option_index, t.label.as_str()))
            .collect();
        assert_eq!(indexed, vec![(0, "Tacos"), (2, "Option 3")]);
        assert_eq!(winners(&tallies)[0].option_index, 0);
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"),
            "SP2J6ZY4...9EJ7"
        );
        assert_eq!(shorten_address("ST1SHORT"), "ST1SHORT");
    }
}
