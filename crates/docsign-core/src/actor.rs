//! Resolving which flow steps are waiting on the acting party
//!
//! Only `Waiting` steps are candidates. How an actor is matched against a
//! step's entities depends on the contract type:
//!
//! - `b2b`: the actor's email or id equals some entity's email or id. Guests
//!   may also match through either contact hint.
//! - `b2c` guest: either contact hint equals some entity's email.
//! - `b2c` authenticated: the single effective email picked by
//!   [`ContactHints::effective_email`] equals some entity's email.
//!
//! Matching is exact and case-sensitive. Resolution never fails; an actor who
//! matches nothing gets an empty set (a read-only view).

use serde::{Deserialize, Serialize};
use shared_types::{ContactHints, ContractType, Document, EmailPrecedence, FlowStep, Identity};
use std::collections::BTreeSet;
use tracing::debug;

/// Knobs for actor resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Rule for the b2c authenticated branch
    #[serde(default)]
    pub b2c_precedence: EmailPrecedence,
}

/// Step indices awaiting `identity`, using the default options
pub fn resolve(document: &Document, identity: &Identity) -> BTreeSet<String> {
    resolve_with(document, identity, ResolverOptions::default())
}

pub fn resolve_with(
    document: &Document,
    identity: &Identity,
    options: ResolverOptions,
) -> BTreeSet<String> {
    let active: BTreeSet<String> = document
        .waiting_steps()
        .filter(|step| step_matches(document.contract_type, step, identity, options))
        .map(|step| step.index.clone())
        .collect();

    debug!(
        document_id = %document.document_id,
        guest = identity.is_guest(),
        active = ?active,
        "resolved active steps"
    );

    active
}

fn step_matches(
    contract: ContractType,
    step: &FlowStep,
    identity: &Identity,
    options: ResolverOptions,
) -> bool {
    match (contract, identity) {
        (ContractType::B2b, _) => {
            non_empty(identity.email()).is_some_and(|e| has_email(step, e))
                || non_empty(identity.id()).is_some_and(|i| has_id(step, i))
                || (identity.is_guest() && any_hint_matches(step, identity.contact()))
        }
        (ContractType::B2c, Identity::Guest { contact, .. }) => any_hint_matches(step, contact),
        (ContractType::B2c, Identity::Authenticated { contact, .. }) => {
            non_empty(contact.effective_email(options.b2c_precedence))
                .is_some_and(|e| has_email(step, e))
        }
    }
}

fn any_hint_matches(step: &FlowStep, contact: &ContactHints) -> bool {
    contact
        .iter()
        .filter(|hint| !hint.is_empty())
        .any(|hint| has_email(step, hint))
}

fn has_email(step: &FlowStep, email: &str) -> bool {
    step.entity_emails().any(|e| e == email)
}

fn has_id(step: &FlowStep, id: &str) -> bool {
    step.entity_ids().any(|i| i == id)
}

// An empty string must never match an entity with a blank email or id
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_types::ActorDescriptor;

    fn document(contract: &str) -> Document {
        serde_json::from_value(json!({
            "documentId": "doc-1",
            "contractType": contract,
            "status": "W",
            "flowSteps": [
                {
                    "index": "1", "status": "Y", "typeEntity": "sender",
                    "entities": [{"id": "u1", "email": "sender@test.com"}]
                },
                {
                    "index": "2", "status": "W", "typeEntity": "personal",
                    "entities": [
                        {"id": "u2", "email": "a@test.com"},
                        {"id": "u3", "email": "b@test.com"}
                    ]
                },
                {
                    "index": "3", "status": "W", "typeEntity": "personal",
                    "entities": [{"id": "u2", "email": "a@test.com"}]
                },
                {
                    "index": "4", "status": "D", "typeEntity": "personal",
                    "entities": [{"id": "u2", "email": "a@test.com"}]
                }
            ]
        }))
        .unwrap()
    }

    fn actor(value: serde_json::Value) -> Identity {
        serde_json::from_value::<ActorDescriptor>(value).unwrap().into()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_b2b_matches_by_email() {
        let active = resolve(&document("b2b"), &actor(json!({"email": "a@test.com"})));
        assert_eq!(active, set(&["2", "3"]));
    }

    #[test]
    fn test_b2b_matches_by_id() {
        let active = resolve(&document("b2b"), &actor(json!({"id": "u3"})));
        assert_eq!(active, set(&["2"]));
    }

    #[test]
    fn test_only_waiting_steps_are_candidates() {
        let active = resolve(&document("b2b"), &actor(json!({"email": "sender@test.com"})));
        assert!(active.is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let active = resolve(&document("b2b"), &actor(json!({"email": "A@test.com"})));
        assert!(active.is_empty());
    }

    #[test]
    fn test_guest_matches_primary() {
        let active = resolve(
            &document("b2c"),
            &actor(json!({"isGuest": true, "guestPrimary": "a@test.com"})),
        );
        assert_eq!(active, set(&["2", "3"]));
    }

    #[test]
    fn test_guest_matches_secondary() {
        let active = resolve(
            &document("b2c"),
            &actor(json!({
                "isGuest": true,
                "guestPrimary": "0901234567",
                "guestSecondary": "b@test.com"
            })),
        );
        assert_eq!(active, set(&["2"]));
    }

    #[test]
    fn test_guest_without_match_is_empty() {
        let active = resolve(
            &document("b2c"),
            &actor(json!({"isGuest": true, "guestPrimary": "nobody@test.com"})),
        );
        assert!(active.is_empty());
    }

    #[test]
    fn test_b2c_authenticated_uses_single_effective_email() {
        // Primary looks like an email, so secondary is never consulted
        let identity = actor(json!({
            "guestPrimary": "nobody@test.com",
            "guestSecondary": "b@test.com"
        }));
        assert!(resolve(&document("b2c"), &identity).is_empty());

        // Primary is not an email; secondary becomes the effective email
        let identity = actor(json!({
            "guestPrimary": "username",
            "guestSecondary": "b@test.com"
        }));
        assert_eq!(resolve(&document("b2c"), &identity), set(&["2"]));
    }

    #[test]
    fn test_b2c_authenticated_ignores_plain_email_field() {
        let identity = actor(json!({"email": "a@test.com"}));
        assert!(resolve(&document("b2c"), &identity).is_empty());
    }

    #[test]
    fn test_b2c_secondary_first_precedence() {
        let identity = actor(json!({
            "guestPrimary": "a@test.com",
            "guestSecondary": "b@test.com"
        }));
        let options = ResolverOptions {
            b2c_precedence: EmailPrecedence::SecondaryFirst,
        };
        assert_eq!(resolve_with(&document("b2c"), &identity, options), set(&["2"]));
        assert_eq!(resolve(&document("b2c"), &identity), set(&["2", "3"]));
    }

    #[test]
    fn test_empty_identifiers_never_match_blank_entities() {
        let doc: Document = serde_json::from_value(json!({
            "documentId": "doc-2",
            "contractType": "b2b",
            "status": "W",
            "flowSteps": [
                {
                    "index": "1", "status": "W", "typeEntity": "personal",
                    "entities": [{"name": "blank"}]
                }
            ]
        }))
        .unwrap();
        let identity = actor(json!({"email": "", "id": ""}));
        assert!(resolve(&doc, &identity).is_empty());
    }

    #[test]
    fn test_b2b_guest_offers_contact_hints() {
        let identity = actor(json!({"isGuest": true, "email": "b@test.com"}));
        assert_eq!(resolve(&document("b2b"), &identity), set(&["2"]));
    }

    #[test]
    fn test_b2b_guest_matches_by_id() {
        let identity = actor(json!({"isGuest": true, "id": "u3"}));
        assert_eq!(resolve(&document("b2b"), &identity), set(&["2"]));
    }

    #[test]
    fn test_b2b_guest_email_survives_primary_hint() {
        let identity = actor(json!({
            "isGuest": true,
            "email": "b@test.com",
            "guestPrimary": "0901234567"
        }));
        assert_eq!(resolve(&document("b2b"), &identity), set(&["2"]));
    }
}
