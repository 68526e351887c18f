use std::collections::HashMap;

// Operators that are illegal between BT and ET.
const OUTSIDE_TEXT_ONLY: &[&str] = &[
    "b", "B", "b*", "B*", "BT", "c", "cm", "Do", "f", "F", "f*", "h", "l", "m", "n", "q", "Q",
    "re", "s", "S", "v", "W", "W*", "y",
];

// Text positioning and showing operators, legal only between BT and ET.
const TEXT_OBJECT_ONLY: &[&str] = &["ET", "T*", "Td", "TD", "Tj", "TJ", "Tm", "'", "\""];

/// Tracks operator nesting as tokens are emitted and records violations.
#[derive(Debug, Default)]
pub(crate) struct ContentValidator {
    enabled: bool,
    depth: usize,
    in_text: bool,
    errors: Vec<String>,
    counters: HashMap<&'static str, u64>,
}

impl ContentValidator {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn check(&mut self, op: &str) {
        if !self.enabled {
            return;
        }
        if self.in_text && OUTSIDE_TEXT_ONLY.contains(&op) {
            self.record("general", format!("Operator {op} inside text object"));
        } else if !self.in_text && TEXT_OBJECT_ONLY.contains(&op) {
            self.record("text", format!("Text operator {op} outside text object"));
        }
        match op {
            "q" => self.depth += 1,
            "Q" => match self.depth.checked_sub(1) {
                Some(depth) => self.depth = depth,
                None => self.record("restore", "Invalid restore".to_string()),
            },
            "BT" => self.in_text = true,
            "ET" => self.in_text = false,
            _ => {}
        }
    }

    fn record(&mut self, kind: &'static str, message: String) {
        let entry = self.counters.entry(kind).or_insert(0);
        *entry = entry.saturating_add(1);
        self.errors.push(message);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Logs the errors collected since the last report as one warning,
    /// capped at `max` lines, and forgets them.
    pub fn report(&mut self, context: &str, max: usize) {
        if self.errors.is_empty() {
            return;
        }
        let errors = std::mem::take(&mut self.errors);
        let mut kinds: Vec<(&str, u64)> = self.counters.drain().collect();
        kinds.sort();
        let mut lines: Vec<&str> = errors.iter().take(max).map(String::as_str).collect();
        if errors.len() > max {
            lines.push("...");
        }
        log::warn!(
            "{} content errors in {} {:?}:\n{}",
            errors.len(),
            context,
            kinds,
            lines.join("\n")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(ops: &[&str]) -> Vec<String> {
        let mut validator = ContentValidator::new(true);
        for op in ops {
            validator.check(op);
        }
        validator.errors().to_vec()
    }

    #[test]
    fn balanced_stream_is_clean() {
        assert!(run(&["q", "m", "l", "S", "BT", "Tf", "Td", "Tj", "ET", "Q"]).is_empty());
    }

    #[test]
    fn flags_path_operators_inside_text() {
        assert_eq!(run(&["BT", "re", "ET"]), vec!["Operator re inside text object"]);
    }

    #[test]
    fn flags_text_operators_outside_text() {
        assert_eq!(run(&["Tj"]), vec!["Text operator Tj outside text object"]);
    }

    #[test]
    fn text_state_is_allowed_anywhere() {
        assert!(run(&["Tc", "Tw", "Tz", "TL", "Tf", "Tr", "Ts", "rg", "gs"]).is_empty());
    }

    #[test]
    fn flags_restore_below_zero_once_per_restore() {
        assert_eq!(run(&["q", "Q", "Q"]), vec!["Invalid restore"]);
    }

    #[test]
    fn disabled_validator_records_nothing() {
        let mut validator = ContentValidator::new(false);
        validator.check("Q");
        validator.check("Tj");
        assert!(validator.errors().is_empty());
    }

    #[test]
    fn report_with_many_errors_does_not_panic() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut validator = ContentValidator::new(true);
        for _ in 0..30 {
            validator.check("Q");
        }
        assert_eq!(validator.errors().len(), 30);
        validator.report("page", 20);
        assert!(validator.errors().is_empty());
    }

    #[test]
    fn report_only_covers_new_errors() {
        let mut validator = ContentValidator::new(true);
        validator.check("Tj");
        validator.report("page", 20);
        assert!(validator.errors().is_empty());
        validator.check("Q");
        assert_eq!(validator.errors(), &["Invalid restore".to_string()]);
        validator.report("page", 20);
        assert!(validator.errors().is_empty());
        assert!(validator.counters.is_empty());
    }
}
