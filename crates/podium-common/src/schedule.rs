//! Event schedule generation.
//!
//! Derives the canonical timetable of judging sessions and robot game
//! matches from the division configuration: teams are laid out
//! back-to-back per room/table, slots shift past break blocks, and a team
//! is never placed in a match wave that overlaps its judging session.
//! If the teams cannot fit before the event end the whole generation
//! fails; the schedule is never silently truncated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::MatchStage;

/// A named block of time during which no sessions or matches may run.
/// The window is half-open: `[start, end)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakBlock {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Inputs to schedule generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub team_count: usize,
    pub room_count: usize,
    pub table_count: usize,
    /// Length of one judging session, in seconds
    pub session_length_seconds: i64,
    /// Length of one match cycle, in seconds
    pub match_length_seconds: i64,
    pub practice_rounds: usize,
    pub ranking_rounds: usize,
    pub judging_start: DateTime<Utc>,
    pub field_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
    #[serde(default)]
    pub breaks: Vec<BreakBlock>,
}

/// One judging session slot: a room at a time, with the team left empty
/// when the roster does not divide evenly across rooms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSlot {
    /// 1-based slot number, shared by all rooms in the same wave
    pub number: u32,
    pub room_index: usize,
    pub team_index: Option<usize>,
    pub scheduled_time: DateTime<Utc>,
}

/// One robot game match: a wave of tables at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSlot {
    /// 1-based running match number across all rounds
    pub number: u32,
    pub stage: MatchStage,
    /// 1-based round number within the stage
    pub round: u32,
    pub scheduled_time: DateTime<Utc>,
    /// One entry per table, in table order
    pub team_indices: Vec<Option<usize>>,
}

/// The generated timetable.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    pub sessions: Vec<SessionSlot>,
    pub matches: Vec<MatchSlot>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid schedule configuration: {0}")]
    InvalidConfig(String),

    #[error("schedule is infeasible: {0}")]
    Infeasible(String),
}

fn overlaps(a_start: DateTime<Utc>, a_end: DateTime<Utc>, b_start: DateTime<Utc>, b_end: DateTime<Utc>) -> bool {
    a_start < b_end && b_start < a_end
}

/// Push `start` forward until the `[start, start + len)` window intersects
/// no break block. Breaks are re-checked after each shift since shifting
/// past one break can land inside another.
fn next_free(mut start: DateTime<Utc>, len: Duration, breaks: &[BreakBlock]) -> DateTime<Utc> {
    loop {
        let mut shifted = false;
        for b in breaks {
            if overlaps(start, start + len, b.start, b.end) {
                start = b.end;
                shifted = true;
            }
        }
        if !shifted {
            return start;
        }
    }
}

impl ScheduleConfig {
    fn validate(&self) -> Result<(), ScheduleError> {
        if self.room_count == 0 {
            return Err(ScheduleError::InvalidConfig("room count must be positive".into()));
        }
        if self.table_count == 0 {
            return Err(ScheduleError::InvalidConfig("table count must be positive".into()));
        }
        if self.session_length_seconds <= 0 || self.match_length_seconds <= 0 {
            return Err(ScheduleError::InvalidConfig(
                "session and match lengths must be positive".into(),
            ));
        }
        if self.event_end <= self.judging_start || self.event_end <= self.field_start {
            return Err(ScheduleError::InvalidConfig(
                "event end must be after judging and field start".into(),
            ));
        }
        Ok(())
    }

    fn session_length(&self) -> Duration {
        Duration::seconds(self.session_length_seconds)
    }

    fn match_length(&self) -> Duration {
        Duration::seconds(self.match_length_seconds)
    }
}

/// Generate the full timetable for a division.
pub fn build_schedule(config: &ScheduleConfig) -> Result<Timetable, ScheduleError> {
    config.validate()?;

    let sessions = build_sessions(config)?;

    // Judging windows per team, for the match/judging overlap check.
    let session_len = config.session_length();
    let judging_windows: Vec<Option<(DateTime<Utc>, DateTime<Utc>)>> = {
        let mut windows = vec![None; config.team_count];
        for slot in &sessions {
            if let Some(team) = slot.team_index {
                windows[team] = Some((slot.scheduled_time, slot.scheduled_time + session_len));
            }
        }
        windows
    };

    let matches = build_matches(config, &judging_windows)?;

    Ok(Timetable { sessions, matches })
}

fn build_sessions(config: &ScheduleConfig) -> Result<Vec<SessionSlot>, ScheduleError> {
    let mut sessions = Vec::new();
    let session_len = config.session_length();
    let waves = config.team_count.div_ceil(config.room_count);

    let mut cursor = config.judging_start;
    for wave in 0..waves {
        let start = next_free(cursor, session_len, &config.breaks);
        if start + session_len > config.event_end {
            return Err(ScheduleError::Infeasible(format!(
                "{} teams need {} judging waves of {}s across {} rooms, which runs past the event end",
                config.team_count, waves, config.session_length_seconds, config.room_count,
            )));
        }

        for room in 0..config.room_count {
            let team = wave * config.room_count + room;
            sessions.push(SessionSlot {
                number: (wave + 1) as u32,
                room_index: room,
                team_index: (team < config.team_count).then_some(team),
                scheduled_time: start,
            });
        }

        cursor = start + session_len;
    }

    Ok(sessions)
}

fn build_matches(
    config: &ScheduleConfig,
    judging_windows: &[Option<(DateTime<Utc>, DateTime<Utc>)>],
) -> Result<Vec<MatchSlot>, ScheduleError> {
    let mut matches = Vec::new();
    let match_len = config.match_length();
    let mut number: u32 = 0;
    let mut cursor = config.field_start;

    let rounds: Vec<(MatchStage, u32)> = (1..=config.practice_rounds)
        .map(|r| (MatchStage::Practice, r as u32))
        .chain((1..=config.ranking_rounds).map(|r| (MatchStage::Ranking, r as u32)))
        .collect();

    for (round_index, (stage, round)) in rounds.into_iter().enumerate() {
        // Rotate the roster each round so teams move across tables.
        let mut queue: std::collections::VecDeque<usize> = (0..config.team_count).collect();
        queue.rotate_left(round_index % config.team_count.max(1));

        while !queue.is_empty() {
            let start = next_free(cursor, match_len, &config.breaks);
            if start + match_len > config.event_end {
                return Err(ScheduleError::Infeasible(format!(
                    "{stage} round {round} does not fit before the event end",
                )));
            }
            let end = start + match_len;

            // Fill tables with teams whose judging session does not overlap
            // this wave; teams still in judging go back on the queue.
            let mut team_indices: Vec<Option<usize>> = Vec::with_capacity(config.table_count);
            let mut skipped = std::collections::VecDeque::new();
            while team_indices.len() < config.table_count {
                let Some(team) = queue.pop_front() else {
                    break;
                };
                let in_judging = judging_windows[team]
                    .map(|(js, je)| overlaps(start, end, js, je))
                    .unwrap_or(false);
                if in_judging {
                    skipped.push_back(team);
                } else {
                    team_indices.push(Some(team));
                }
            }
            queue.extend(skipped);

            cursor = end;
            if team_indices.is_empty() {
                // Every remaining team is in judging during this wave.
                continue;
            }
            team_indices.resize(config.table_count, None);

            number += 1;
            matches.push(MatchSlot {
                number,
                stage,
                round,
                scheduled_time: start,
                team_indices,
            });
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, min, 0).unwrap()
    }

    fn base_config() -> ScheduleConfig {
        ScheduleConfig {
            team_count: 10,
            room_count: 2,
            table_count: 4,
            session_length_seconds: 1500,
            match_length_seconds: 300,
            practice_rounds: 1,
            ranking_rounds: 3,
            judging_start: at(9, 0),
            field_start: at(9, 0),
            event_end: at(17, 0),
            breaks: vec![],
        }
    }

    fn assert_invariants(config: &ScheduleConfig, timetable: &Timetable) {
        let session_len = Duration::seconds(config.session_length_seconds);
        let match_len = Duration::seconds(config.match_length_seconds);

        // No room hosts two overlapping sessions.
        for a in &timetable.sessions {
            for b in &timetable.sessions {
                if std::ptr::eq(a, b) || a.room_index != b.room_index {
                    continue;
                }
                assert!(
                    !overlaps(
                        a.scheduled_time,
                        a.scheduled_time + session_len,
                        b.scheduled_time,
                        b.scheduled_time + session_len,
                    ),
                    "room {} double-booked at {}",
                    a.room_index,
                    a.scheduled_time
                );
            }
        }

        // No team is in a match wave that overlaps its judging session.
        for slot in &timetable.sessions {
            let Some(team) = slot.team_index else { continue };
            for m in &timetable.matches {
                if m.team_indices.contains(&Some(team)) {
                    assert!(
                        !overlaps(
                            slot.scheduled_time,
                            slot.scheduled_time + session_len,
                            m.scheduled_time,
                            m.scheduled_time + match_len,
                        ),
                        "team {team} double-booked between judging and match {}",
                        m.number
                    );
                }
            }
        }

        // Each team appears exactly once per round, once in judging.
        let judged: Vec<usize> = timetable.sessions.iter().filter_map(|s| s.team_index).collect();
        for team in 0..config.team_count {
            assert_eq!(judged.iter().filter(|&&t| t == team).count(), 1);
        }
        for round in 1..=config.ranking_rounds as u32 {
            for team in 0..config.team_count {
                let appearances = timetable
                    .matches
                    .iter()
                    .filter(|m| m.stage == MatchStage::Ranking && m.round == round)
                    .flat_map(|m| m.team_indices.iter())
                    .filter(|&&t| t == Some(team))
                    .count();
                assert_eq!(appearances, 1, "team {team} in ranking round {round}");
            }
        }
    }

    #[test]
    fn ten_teams_two_rooms_gives_five_waves() {
        let config = base_config();
        let timetable = build_schedule(&config).unwrap();

        let waves: std::collections::BTreeSet<u32> =
            timetable.sessions.iter().map(|s| s.number).collect();
        assert_eq!(waves.len(), 5);
        assert_eq!(timetable.sessions.len(), 10);

        // No two teams share a room+slot.
        let mut seen = std::collections::HashSet::new();
        for slot in &timetable.sessions {
            assert!(seen.insert((slot.number, slot.room_index)));
        }

        assert_invariants(&config, &timetable);
    }

    #[test]
    fn uneven_roster_leaves_trailing_empty_slot() {
        let mut config = base_config();
        config.team_count = 7;
        config.room_count = 3;
        let timetable = build_schedule(&config).unwrap();

        assert_eq!(timetable.sessions.len(), 9);
        let empty: Vec<&SessionSlot> = timetable
            .sessions
            .iter()
            .filter(|s| s.team_index.is_none())
            .collect();
        assert_eq!(empty.len(), 2);
        assert!(empty.iter().all(|s| s.number == 3));

        assert_invariants(&config, &timetable);
    }

    #[test]
    fn sessions_are_back_to_back_per_room() {
        let config = base_config();
        let timetable = build_schedule(&config).unwrap();

        let mut room0: Vec<DateTime<Utc>> = timetable
            .sessions
            .iter()
            .filter(|s| s.room_index == 0)
            .map(|s| s.scheduled_time)
            .collect();
        room0.sort();
        for pair in room0.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::seconds(1500));
        }
    }

    #[test]
    fn break_block_shifts_following_slots() {
        let mut config = base_config();
        config.breaks = vec![BreakBlock {
            name: "opening ceremony".into(),
            start: at(9, 20),
            end: at(9, 50),
        }];
        let timetable = build_schedule(&config).unwrap();

        let session_len = Duration::seconds(1500);
        for slot in &timetable.sessions {
            assert!(
                !overlaps(
                    slot.scheduled_time,
                    slot.scheduled_time + session_len,
                    at(9, 20),
                    at(9, 50),
                ),
                "session slot intersects the break"
            );
        }

        // The first wave (09:00 + 25min would cross the break) moved past it.
        let first = timetable
            .sessions
            .iter()
            .map(|s| s.scheduled_time)
            .min()
            .unwrap();
        assert_eq!(first, at(9, 50));
    }

    #[test]
    fn oversubscribed_event_is_infeasible_not_truncated() {
        let mut config = base_config();
        config.event_end = at(10, 0);
        let err = build_schedule(&config).unwrap_err();
        assert!(matches!(err, ScheduleError::Infeasible(_)));
    }

    #[test]
    fn field_rounds_past_event_end_are_infeasible() {
        let mut config = base_config();
        config.ranking_rounds = 500;
        let err = build_schedule(&config).unwrap_err();
        assert!(matches!(err, ScheduleError::Infeasible(_)));
    }

    #[test]
    fn zero_rooms_rejected() {
        let mut config = base_config();
        config.room_count = 0;
        assert!(matches!(
            build_schedule(&config),
            Err(ScheduleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn match_waves_respect_table_capacity() {
        let config = base_config();
        let timetable = build_schedule(&config).unwrap();
        for m in &timetable.matches {
            assert_eq!(m.team_indices.len(), config.table_count);
            let filled = m.team_indices.iter().flatten().count();
            assert!(filled >= 1 && filled <= config.table_count);
        }
    }

    #[test]
    fn concurrent_field_and_judging_never_double_book_a_team() {
        let mut config = base_config();
        // Field starts while judging is running.
        config.field_start = at(9, 10);
        let timetable = build_schedule(&config).unwrap();
        assert_invariants(&config, &timetable);
    }
}
