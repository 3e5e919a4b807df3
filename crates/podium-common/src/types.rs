//! Common types used across Podium services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Division ID type
pub type DivisionId = Uuid;

/// Team ID type
pub type TeamId = Uuid;

/// Judging room ID type
pub type RoomId = Uuid;

/// Robot game table ID type
pub type TableId = Uuid;

/// Judging session ID type
pub type SessionId = Uuid;

/// Robot game match ID type
pub type MatchId = Uuid;

/// User ID type
pub type UserId = Uuid;

/// Lifecycle status shared by judging sessions and robot game matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Scheduled but not yet begun
    NotStarted,
    /// Currently running
    InProgress,
    /// Finished normally
    Completed,
    /// Cut short; terminal
    Aborted,
}

impl Default for Status {
    fn default() -> Self {
        Status::NotStarted
    }
}

impl Status {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Aborted)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::NotStarted => write!(f, "not-started"),
            Status::InProgress => write!(f, "in-progress"),
            Status::Completed => write!(f, "completed"),
            Status::Aborted => write!(f, "aborted"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(Status::NotStarted),
            "in-progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "aborted" => Ok(Status::Aborted),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Completion status of a rubric document (and of the per-category
/// indicators embedded in a judging session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RubricStatus {
    /// Created at event setup, untouched
    Empty,
    /// A judge has started filling it in
    InProgress,
    /// All required fields filled
    Completed,
    /// Submitted to the judge advisor
    WaitingForReview,
    /// Reviewed and final
    Ready,
}

impl Default for RubricStatus {
    fn default() -> Self {
        RubricStatus::Empty
    }
}

impl RubricStatus {
    /// Whether this status counts as completed for the session-completion
    /// gate (anything at or past `Completed`).
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            RubricStatus::Completed | RubricStatus::WaitingForReview | RubricStatus::Ready
        )
    }
}

impl std::fmt::Display for RubricStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RubricStatus::Empty => write!(f, "empty"),
            RubricStatus::InProgress => write!(f, "in-progress"),
            RubricStatus::Completed => write!(f, "completed"),
            RubricStatus::WaitingForReview => write!(f, "waiting-for-review"),
            RubricStatus::Ready => write!(f, "ready"),
        }
    }
}

impl std::str::FromStr for RubricStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(RubricStatus::Empty),
            "in-progress" => Ok(RubricStatus::InProgress),
            "completed" => Ok(RubricStatus::Completed),
            "waiting-for-review" => Ok(RubricStatus::WaitingForReview),
            "ready" => Ok(RubricStatus::Ready),
            other => Err(format!("unknown rubric status: {other}")),
        }
    }
}

/// The three judging categories every team is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JudgingCategory {
    CoreValues,
    InnovationProject,
    RobotDesign,
}

impl JudgingCategory {
    /// All categories, in rubric-seeding order.
    pub const ALL: [JudgingCategory; 3] = [
        JudgingCategory::CoreValues,
        JudgingCategory::InnovationProject,
        JudgingCategory::RobotDesign,
    ];
}

impl std::fmt::Display for JudgingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JudgingCategory::CoreValues => write!(f, "core-values"),
            JudgingCategory::InnovationProject => write!(f, "innovation-project"),
            JudgingCategory::RobotDesign => write!(f, "robot-design"),
        }
    }
}

impl std::str::FromStr for JudgingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core-values" => Ok(JudgingCategory::CoreValues),
            "innovation-project" => Ok(JudgingCategory::InnovationProject),
            "robot-design" => Ok(JudgingCategory::RobotDesign),
            other => Err(format!("unknown judging category: {other}")),
        }
    }
}

/// Robot game match stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStage {
    Practice,
    Ranking,
    Test,
}

impl std::fmt::Display for MatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStage::Practice => write!(f, "practice"),
            MatchStage::Ranking => write!(f, "ranking"),
            MatchStage::Test => write!(f, "test"),
        }
    }
}

impl std::str::FromStr for MatchStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practice" => Ok(MatchStage::Practice),
            "ranking" => Ok(MatchStage::Ranking),
            "test" => Ok(MatchStage::Test),
            other => Err(format!("unknown match stage: {other}")),
        }
    }
}

/// User role at the tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Full system access across divisions
    Admin,
    /// Runs the division
    TournamentManager,
    /// Oversees all judging rooms
    JudgeAdvisor,
    /// Leads one judging category
    LeadJudge,
    /// Judges in one room
    Judge,
    /// Oversees all game tables
    HeadReferee,
    /// Referees one table
    Referee,
    /// Enters scores
    Scorekeeper,
    /// Runs the pit area
    PitAdmin,
    /// Drives the audience display
    AudienceDisplay,
    /// Read-only reporting access
    Reports,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::TournamentManager => "tournament-manager",
            Role::JudgeAdvisor => "judge-advisor",
            Role::LeadJudge => "lead-judge",
            Role::Judge => "judge",
            Role::HeadReferee => "head-referee",
            Role::Referee => "referee",
            Role::Scorekeeper => "scorekeeper",
            Role::PitAdmin => "pit-admin",
            Role::AudienceDisplay => "audience-display",
            Role::Reports => "reports",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "tournament-manager" => Ok(Role::TournamentManager),
            "judge-advisor" => Ok(Role::JudgeAdvisor),
            "lead-judge" => Ok(Role::LeadJudge),
            "judge" => Ok(Role::Judge),
            "head-referee" => Ok(Role::HeadReferee),
            "referee" => Ok(Role::Referee),
            "scorekeeper" => Ok(Role::Scorekeeper),
            "pit-admin" => Ok(Role::PitAdmin),
            "audience-display" => Ok(Role::AudienceDisplay),
            "reports" => Ok(Role::Reports),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Team affiliation details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    pub institution: String,
    pub city: String,
}

/// A (table, team) pairing inside a robot game match. The team slot stays
/// empty when the schedule leaves a table unoccupied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchParticipant {
    pub table_id: TableId,
    pub team_id: Option<TeamId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_strings() {
        for status in [
            Status::NotStarted,
            Status::InProgress,
            Status::Completed,
            Status::Aborted,
        ] {
            let parsed: Status = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("started".parse::<Status>().is_err());
    }

    #[test]
    fn rubric_status_completion_gate() {
        assert!(!RubricStatus::Empty.is_completed());
        assert!(!RubricStatus::InProgress.is_completed());
        assert!(RubricStatus::Completed.is_completed());
        assert!(RubricStatus::WaitingForReview.is_completed());
        assert!(RubricStatus::Ready.is_completed());
    }

    #[test]
    fn category_serializes_kebab_case() {
        let json = serde_json::to_string(&JudgingCategory::InnovationProject).unwrap();
        assert_eq!(json, "\"innovation-project\"");
    }
}
