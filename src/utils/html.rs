/// Clean quiz text before it is shown in the browser.
///
/// Whitelist-based: safe formatting tags (like <b>, <code>) survive, while
/// <script>, <iframe> and event-handler attributes are stripped. Quiz content
/// comes from authors, not from us, so every prompt and option goes through here.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_text() {
        assert_eq!(clean_html("Which planet is largest?"), "Which planet is largest?");
    }

    #[test]
    fn removes_script_content() {
        assert_eq!(clean_html("<script>steal()</script>Hi"), "Hi");
    }
}
