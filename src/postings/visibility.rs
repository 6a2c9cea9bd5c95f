use crate::{
    db::{Posting, User},
    taxonomy::Taxonomy,
};

use super::eligibility::meets_must_have;

/// Whether `viewer` gets to see `posting` at all.
///
/// Only strict postings ever hide, and only from the roles they are addressed to:
/// anyone outside the audience sees the listing as-is.
pub fn is_visible(taxonomy: &Taxonomy, posting: &Posting, viewer: &User) -> bool {
    if posting.owner_id == viewer.id {
        return true;
    }
    if !posting.strict_visibility || !posting.audience.admits(posting.owner_role, viewer.role) {
        return true;
    }

    meets_must_have(taxonomy, posting, viewer)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::db::{Audience, Capacity, PostingKind, PostingStatus, Role};

    fn strict_nlp_posting() -> Posting {
        Posting {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            owner_role: Role::Faculty,
            kind: PostingKind::Project,
            title: "Dialect corpus".to_owned(),
            description: String::new(),
            terms: String::new(),
            audience: Audience::OtherRolesOnly,
            capacity: Capacity { students: 4, ..Default::default() },
            strict_visibility: true,
            status: PostingStatus::Open,
            must_have: BTreeSet::from(["nlp".to_owned()]),
            nice_to_have: BTreeSet::new(),
            apply_deadline: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn viewer(role: Role, skills: &str) -> User {
        User {
            id: Uuid::now_v7(),
            name: "Viewer".to_owned(),
            role,
            skills: skills.to_owned(),
            interests: String::new(),
        }
    }

    #[test]
    fn strict_posting_hides_from_unskilled_audience() {
        let taxonomy = Taxonomy::builtin();
        let posting = strict_nlp_posting();

        assert!(!is_visible(&taxonomy, &posting, &viewer(Role::Student, "")));
        assert!(is_visible(&taxonomy, &posting, &viewer(Role::Student, "NLP research")));
        assert!(is_visible(
            &taxonomy,
            &posting,
            &viewer(Role::Student, "Natural Language Processing")
        ));
    }

    #[test]
    fn roles_outside_the_audience_always_see_it() {
        let taxonomy = Taxonomy::builtin();
        let posting = strict_nlp_posting();

        assert!(is_visible(&taxonomy, &posting, &viewer(Role::Faculty, "")));
    }

    #[test]
    fn owner_always_sees_own_posting() {
        let taxonomy = Taxonomy::builtin();
        let posting = strict_nlp_posting();
        let mut owner = viewer(Role::Faculty, "");
        owner.id = posting.owner_id;

        assert!(is_visible(&taxonomy, &posting, &owner));
    }

    #[test]
    fn non_strict_or_empty_must_have_is_visible() {
        let taxonomy = Taxonomy::builtin();
        let mut posting = strict_nlp_posting();
        posting.strict_visibility = false;
        assert!(is_visible(&taxonomy, &posting, &viewer(Role::Student, "")));

        posting.strict_visibility = true;
        posting.must_have.clear();
        assert!(is_visible(&taxonomy, &posting, &viewer(Role::Student, "")));
    }
}
