use chrono::{Datelike, NaiveDate, Weekday};

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "一",
        Weekday::Tue => "二",
        Weekday::Wed => "三",
        Weekday::Thu => "四",
        Weekday::Fri => "五",
        Weekday::Sat => "六",
        Weekday::Sun => "日",
    }
}

/// Board heading for `date`, e.g. `3.9星期一 晚自习建议`.
pub fn heading(date: NaiveDate) -> String {
    format!(
        "{}.{}星期{} 晚自习建议",
        date.month(),
        date.day(),
        weekday_name(date.weekday())
    )
}
