/// Suffix Evergreen appends to the name of a task that generates other tasks.
pub const GEN_SUFFIX: &str = "_gen";

/// Strip the generator suffix from a task name, if present.
pub fn remove_gen_suffix(task_name: &str) -> &str {
    task_name.strip_suffix(GEN_SUFFIX).unwrap_or(task_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_gen_suffix() {
        assert_eq!(remove_gen_suffix("jsCore_gen"), "jsCore");
    }

    #[test]
    fn leaves_other_names_untouched() {
        assert_eq!(remove_gen_suffix("jsCore"), "jsCore");
        assert_eq!(remove_gen_suffix("gen_jsCore"), "gen_jsCore");
        assert_eq!(remove_gen_suffix("jsCore_gen_auth"), "jsCore_gen_auth");
    }

    #[test]
    fn strips_only_one_suffix() {
        assert_eq!(remove_gen_suffix("fuzzer_gen_gen"), "fuzzer_gen");
    }
}
