use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Student,
    Faculty,
    ClubOrganizer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Faculty, Role::ClubOrganizer];
}

/// Who, relative to the owner's role, may take part in a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Audience {
    OwnerRoleOnly,
    OtherRolesOnly,
    Both,
}

impl Audience {
    pub fn admits(self, owner_role: Role, viewer_role: Role) -> bool {
        match self {
            Audience::OwnerRoleOnly => viewer_role == owner_role,
            Audience::OtherRolesOnly => viewer_role != owner_role,
            Audience::Both => true,
        }
    }
}

/// A student's own project, or one of the two faculty collaboration types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PostingKind {
    PersonalProject,
    Project,
    Article,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PostingStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Join requests are decided by the posting owner, invitations by the invitee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestOrigin {
    Join,
    Invite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl From<Decision> for RequestStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => RequestStatus::Accepted,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub skills: String,
    pub interests: String,
}

/// Participant slots per role. Zero means the posting does not take that role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub students: u32,
    pub faculty: u32,
    pub club_organizers: u32,
}

impl Capacity {
    pub fn limit(&self, role: Role) -> u32 {
        match role {
            Role::Student => self.students,
            Role::Faculty => self.faculty,
            Role::ClubOrganizer => self.club_organizers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_role: Role,
    pub kind: PostingKind,
    pub title: String,
    pub description: String,
    /// Free-text domain / tech stack, e.g. "Rust, Web Dev".
    pub terms: String,
    pub audience: Audience,
    pub capacity: Capacity,
    pub strict_visibility: bool,
    pub status: PostingStatus,
    pub must_have: BTreeSet<String>,
    pub nice_to_have: BTreeSet<String>,
    pub apply_deadline: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl Posting {
    pub fn is_open(&self) -> bool {
        self.status == PostingStatus::Open
    }

    pub fn deadline_passed(&self, now: OffsetDateTime) -> bool {
        self.apply_deadline.is_some_and(|deadline| now > deadline)
    }
}

/// Owner-supplied fields for a new posting. Requirement tiers are raw text and go
/// through term extraction on the way in.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPosting {
    pub kind: PostingKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub terms: String,
    pub audience: Audience,
    #[serde(default)]
    pub capacity: Capacity,
    #[serde(default)]
    pub strict_visibility: bool,
    #[serde(default)]
    pub must_have: String,
    #[serde(default)]
    pub nice_to_have: String,
    #[serde(default)]
    pub apply_deadline: Option<OffsetDateTime>,
}

/// Replacement values for an owner's edit. Kind and status are not editable.
#[derive(Debug, Clone, Deserialize)]
pub struct PostingUpdate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub terms: String,
    pub audience: Audience,
    #[serde(default)]
    pub capacity: Capacity,
    #[serde(default)]
    pub strict_visibility: bool,
    #[serde(default)]
    pub must_have: String,
    #[serde(default)]
    pub nice_to_have: String,
    #[serde(default)]
    pub apply_deadline: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    pub posting_id: Uuid,
    /// The candidate, whichever side initiated.
    pub requester_id: Uuid,
    pub origin: RequestOrigin,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: OffsetDateTime,
}

impl Request {
    pub fn pending(
        posting_id: Uuid,
        requester_id: Uuid,
        origin: RequestOrigin,
        message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            posting_id,
            requester_id,
            origin,
            message,
            status: RequestStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// The only party allowed to accept or reject this request.
    pub fn decider(&self, posting: &Posting) -> Uuid {
        match self.origin {
            RequestOrigin::Join => posting.owner_id,
            RequestOrigin::Invite => self.requester_id,
        }
    }
}
