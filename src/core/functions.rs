use rand::Rng;
use time::OffsetDateTime;
use uuid::Uuid;

const NAMES: [&str; 6] = ["Alice", "Bob", "Charlie", "Diana", "Eve", "Frank"];

/// Builtins available as `{{$name}}` in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicFunction {
    RandomInt,
    RandomUuid,
    RandomEmail,
    RandomName,
    Timestamp,
}

const TABLE: [(&str, DynamicFunction); 5] = [
    ("$randomInt", DynamicFunction::RandomInt),
    ("$randomUUID", DynamicFunction::RandomUuid),
    ("$randomEmail", DynamicFunction::RandomEmail),
    ("$randomName", DynamicFunction::RandomName),
    ("$timestamp", DynamicFunction::Timestamp),
];

impl DynamicFunction {
    pub fn lookup(token: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, function)| *function)
    }

    pub fn evaluate(self) -> String {
        let mut rng = rand::thread_rng();
        match self {
            DynamicFunction::RandomInt => rng.gen_range(0..1_000_000u32).to_string(),
            // version/variant bits are left as generated
            DynamicFunction::RandomUuid => Uuid::from_bytes(rng.gen()).hyphenated().to_string(),
            DynamicFunction::RandomEmail => {
                format!("user{}@example.com", rng.gen_range(1000..10000u32))
            }
            DynamicFunction::RandomName => NAMES[rng.gen_range(0..NAMES.len())].to_string(),
            DynamicFunction::Timestamp => OffsetDateTime::now_utc().unix_timestamp().to_string(),
        }
    }
}

/// Evaluates a `$`-prefixed token; unknown names come back unchanged.
pub fn resolve_function(token: &str) -> String {
    match DynamicFunction::lookup(token) {
        Some(function) => function.evaluate(),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_int_stays_in_range() {
        for _ in 0..200 {
            let value: u32 = resolve_function("$randomInt").parse().unwrap();
            assert!(value < 1_000_000);
        }
    }

    #[test]
    fn uuid_has_hyphenated_layout() {
        let uuid = resolve_function("$randomUUID");
        assert_eq!(uuid.len(), 36);
        let groups: Vec<usize> = uuid.split('-').map(str::len).collect();
        assert_eq!(groups, vec![8, 4, 4, 4, 12]);
        assert!(uuid
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn email_and_name() {
        let email = resolve_function("$randomEmail");
        let digits = email
            .strip_prefix("user")
            .and_then(|rest| rest.strip_suffix("@example.com"))
            .unwrap();
        assert_eq!(digits.len(), 4);
        assert!(digits.parse::<u32>().is_ok());
        assert!(NAMES.contains(&resolve_function("$randomName").as_str()));
    }

    #[test]
    fn timestamp_is_current_unix_seconds() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let ts: i64 = resolve_function("$timestamp").parse().unwrap();
        assert!((ts - now).abs() <= 2);
    }

    #[test]
    fn unknown_function_is_returned_verbatim() {
        assert_eq!(resolve_function("$nope"), "$nope");
    }
}
