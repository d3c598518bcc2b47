use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    re.is_match(email)
}

pub fn validate_password(password: &str) -> bool {
    password.len() >= 6
}

pub fn validate_full_name(name: &str) -> bool {
    let trimmed = name.trim();
    (2..=100).contains(&trimmed.chars().count())
}

pub fn validate_rating(rating: i32) -> bool {
    (1..=5).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("jana.novakova@seznam.cz"));
        assert!(!validate_email("jana.novakova"));
        assert!(!validate_email("@seznam.cz"));
        assert!(!validate_email("jana@localhost"));
    }

    #[test]
    fn password_needs_six_chars() {
        assert!(validate_password("heslo123"));
        assert!(validate_password("kratke")); // exactly six
        assert!(!validate_password("pet55"));
    }

    #[test]
    fn rating_bounds() {
        for rating in 1..=5 {
            assert!(validate_rating(rating));
        }
        assert!(!validate_rating(0));
        assert!(!validate_rating(6));
        assert!(!validate_rating(-3));
    }

    #[test]
    fn full_name_bounds() {
        assert!(validate_full_name("Jan Novák"));
        assert!(validate_full_name("  Al  "));
        assert!(!validate_full_name("J"));
        assert!(!validate_full_name(&"a".repeat(101)));
    }
}
