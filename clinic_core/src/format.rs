//! Display formatting in the clinic's locale (pt-BR).

use chrono::NaiveDate;

/// Format a price as Brazilian Real, e.g. `R$ 1.234,50`
pub fn format_brl(price: f64) -> String {
    let cents = (price * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    // Group thousands with '.'
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{:02}", sign, grouped, fraction)
}

/// Format a duration in minutes: `45min`, `1h`, `1h 30min`
pub fn format_duration(minutes: u32) -> String {
    if minutes >= 60 {
        let hours = minutes / 60;
        let rest = minutes % 60;
        if rest > 0 {
            format!("{}h {}min", hours, rest)
        } else {
            format!("{}h", hours)
        }
    } else {
        format!("{}min", minutes)
    }
}

/// `dd/MM/yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(150.0), "R$ 150,00");
        assert_eq!(format_brl(85.5), "R$ 85,50");
        assert_eq!(format_brl(45250.0), "R$ 45.250,00");
        assert_eq!(format_brl(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_brl(0.0), "R$ 0,00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(20), "20min");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(90), "1h 30min");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(date), "05/01/2024");
    }
}
