//! Identifier generation: execution ids (`spec.md §4.5`) and action
//! correlation ids (`spec.md §3`).

use uuid::Uuid;

pub fn new_execution_id() -> String {
    format!("exec-{}", short_uuid())
}

pub fn new_correlation_id(service: &str, kind: &str) -> String {
    format!("chaos-{service}-{kind}-{}", short_uuid())
}

fn short_uuid() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_ids_have_expected_prefix() {
        assert!(new_execution_id().starts_with("exec-"));
    }

    #[test]
    fn correlation_ids_embed_service_and_kind() {
        let id = new_correlation_id("exchange", "disconnect");
        assert!(id.starts_with("chaos-exchange-disconnect-"));
    }

    #[test]
    fn generated_ids_are_not_trivially_colliding() {
        let a = new_execution_id();
        let b = new_execution_id();
        assert_ne!(a, b);
    }
}
