use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::models::slot_key::split_slot;
use crate::models::{Reservation, ReservationStatus, Triggers};
use crate::services::slots::parse_group_date;

const STATUSES: [ReservationStatus; 3] = [
    ReservationStatus::Active,
    ReservationStatus::Done,
    ReservationStatus::Missed,
];

#[derive(Debug)]
pub struct DateGroup<'a> {
    pub date: String,
    pub rows: Vec<&'a Reservation>,
}

/// Groups reservations by the date part of their slot. Groups run in calendar
/// order with unreadable dates last; rows within a group run by time of day,
/// unreadable times last in their stored order.
pub fn group_reservations<'a>(
    reservations: &'a [Reservation],
    triggers: &Triggers,
    today: NaiveDate,
) -> Vec<DateGroup<'a>> {
    let mut by_date: BTreeMap<String, Vec<&'a Reservation>> = BTreeMap::new();
    for r in reservations {
        let key = triggers.normalize(&r.time);
        let (date, _) = split_slot(&key);
        by_date.entry(date.to_string()).or_default().push(r);
    }

    let mut groups: Vec<DateGroup<'a>> = by_date
        .into_iter()
        .map(|(date, mut rows)| {
            rows.sort_by_key(|r| {
                let t = time_of_day(&triggers.normalize(&r.time));
                (t.is_none(), t)
            });
            DateGroup { date, rows }
        })
        .collect();

    // BTreeMap order is lexical; the stable sort keeps it among unparsed dates.
    groups.sort_by_key(|g| {
        let d = parse_group_date(&g.date, today);
        (d.is_none(), d)
    });
    groups
}

fn time_of_day(key: &str) -> Option<NaiveTime> {
    let (_, time) = split_slot(key);
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

/// Escape text for HTML element content and quoted attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn query(pairs: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

/// Renders the admin page. `credential` is carried into every link and form
/// so actions land back on an authenticated view.
pub fn render_admin_page(groups: &[DateGroup<'_>], triggers: &Triggers, credential: &str) -> String {
    let total: usize = groups.iter().map(|g| g.rows.len()).sum();
    let pw = html_escape(credential);

    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"zh-Hant\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>預約管理</title>\n<style>\n\
         body { font-family: sans-serif; margin: 2em; }\n\
         table { border-collapse: collapse; margin-bottom: 2em; width: 100%; }\n\
         th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }\n\
         tr.status-done { background: #e6f4ea; }\n\
         tr.status-missed { background: #fdecea; color: #888; }\n\
         form { display: inline; }\n\
         </style>\n</head>\n<body>\n<h1>預約管理</h1>\n",
    );
    html.push_str(&format!("<p class=\"summary\">共 {total} 筆預約</p>\n"));

    if groups.is_empty() {
        html.push_str("<p class=\"empty\">目前沒有預約</p>\n");
    }

    for group in groups {
        html.push_str(&format!("<h2>{}</h2>\n", html_escape(&group.date)));
        html.push_str(
            "<table>\n<thead><tr><th>時間</th><th>姓名</th><th>電話</th><th>狀態</th><th>操作</th></tr></thead>\n<tbody>\n",
        );
        for r in &group.rows {
            html.push_str(&render_row(r, triggers, credential, &pw));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_row(r: &Reservation, triggers: &Triggers, credential: &str, pw: &str) -> String {
    let key = triggers.normalize(&r.time);
    let status = r.status();
    let time = html_escape(&key);
    let name = html_escape(&r.display_name);
    let user_id = html_escape(&r.user_id);

    let delete = query(&[
        ("password", credential),
        ("user_id", r.user_id.as_str()),
        ("time", key.as_str()),
    ]);

    let status_links: Vec<String> = STATUSES
        .iter()
        .filter(|s| **s != status)
        .map(|s| {
            let q = query(&[
                ("password", credential),
                ("user_id", r.user_id.as_str()),
                ("time", key.as_str()),
                ("status", s.as_str()),
            ]);
            format!(
                "<a class=\"mark-{}\" href=\"/admin/mark?{}\">{}</a>",
                s.as_str(),
                html_escape(&q),
                s.as_str()
            )
        })
        .collect();

    format!(
        "<tr class=\"status-{status}\">\
         <td>{time}</td>\
         <td><form method=\"post\" action=\"/admin/edit_name\">\
         <input type=\"hidden\" name=\"password\" value=\"{pw}\">\
         <input type=\"hidden\" name=\"old_name\" value=\"{name}\">\
         <input type=\"hidden\" name=\"time\" value=\"{time}\">\
         <input type=\"text\" name=\"new_name\" value=\"{name}\">\
         <button type=\"submit\">改名</button></form></td>\
         <td><form method=\"post\" action=\"/admin/update_phone\">\
         <input type=\"hidden\" name=\"password\" value=\"{pw}\">\
         <input type=\"hidden\" name=\"user_id\" value=\"{user_id}\">\
         <input type=\"hidden\" name=\"time\" value=\"{time}\">\
         <input type=\"text\" name=\"phone\" value=\"{phone}\">\
         <button type=\"submit\">儲存</button></form></td>\
         <td>{status}</td>\
         <td>{links} <a class=\"delete\" href=\"/admin/delete?{delete}\" \
         onclick=\"return confirm('確定刪除？')\">刪除</a></td>\
         </tr>\n",
        status = status.as_str(),
        phone = html_escape(r.phone()),
        links = status_links.join(" "),
        delete = html_escape(&delete),
    )
}
