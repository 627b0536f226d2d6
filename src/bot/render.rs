//! Reply rendering — pure `&T -> String` functions, HTML parse mode.
//!
//! Every absent value renders as an explicit "not found" line; a line is
//! never silently dropped from the report. User-supplied strings go
//! through [`escape`] before being embedded.

use teloxide::utils::html::escape;

use crate::dialogue::DialogueState;
use crate::net::NetReport;
use crate::store::Record;

pub fn help_text() -> String {
    concat!(
        "<b>Привет! Я — бот-помощник по локальной сети.</b>\n\n",
        "🔹 <b>/network</b> — отчёт о текущей сети: SSID, локальный IP, шлюз.\n",
        "🔹 <b>/wifiprofiles</b> — сохранённые Wi-Fi профили.\n",
        "🔹 <b>/wifipass имя_профиля</b> — пароль сохранённого профиля.\n",
        "🔹 <b>/wifipass_all</b> — все профили с паролями (если доступны).\n",
        "🔹 <b>/fill</b> — добавить запись в таблицу (пошагово, /skip — пропустить поле, /cancel — отмена).\n",
        "🔹 <b>/showtable</b> — показать все сохранённые записи.\n\n",
        "Внимание: отображение паролей требует прав и доступно только на локальной машине."
    )
    .to_string()
}

pub fn render_report(report: &NetReport) -> String {
    let mut lines = vec!["<b>Сетевой отчёт</b>".to_string(), String::new()];

    match &report.ssid {
        Some(ssid) => lines.push(format!("🔸 <b>Имя сети (SSID):</b> <code>{}</code>", escape(ssid))),
        None => lines.push("🔸 <b>Имя сети (SSID):</b> <i>Не подключено / не найдено</i>".into()),
    }
    match &report.adapter_ip {
        Some(ip) => lines.push(format!("🔹 <b>Локальный IP (adapter):</b> <code>{}</code>", escape(ip))),
        None => lines.push("🔹 <b>Локальный IP (adapter):</b> <i>Не найден</i>".into()),
    }
    lines.push(format!(
        "🔹 <b>Определённый IP (метод UDP):</b> <code>{}</code>",
        escape(&report.probed_ip)
    ));
    match &report.gateway {
        Some(gw) => lines.push(format!("🔸 <b>Шлюз (Default Gateway):</b> <code>{}</code>", escape(gw))),
        None => lines.push("🔸 <b>Шлюз (Default Gateway):</b> <i>Не найден</i>".into()),
    }

    lines.push(String::new());
    lines.push("Сохранённые Wi-Fi профили: <code>/wifiprofiles</code>".into());
    lines.push("Пароль профиля: <code>/wifipass имя_профиля</code>".into());
    lines.join("\n")
}

pub fn render_profiles(profiles: &[String]) -> String {
    if profiles.is_empty() {
        return "<i>Сохранённых Wi-Fi профилей не найдено.</i>".to_string();
    }
    let mut lines = vec!["<b>Сохранённые Wi-Fi профили:</b>".to_string()];
    for p in profiles {
        lines.push(format!("• <code>{}</code>", escape(p)));
    }
    lines.push(String::new());
    lines.push("Используйте: <code>/wifipass имя_профиля</code>".into());
    lines.join("\n")
}

pub fn render_password(profile: &str, password: Option<&str>) -> String {
    match password {
        Some(pwd) => format!(
            "<b>Пароль для</b> <code>{}</code>:\n<code>{}</code>",
            escape(profile),
            escape(pwd)
        ),
        // "No password set" and "access denied" are indistinguishable here.
        None => format!(
            "Не удалось найти пароль для <code>{}</code> (или отсутствуют права).",
            escape(profile)
        ),
    }
}

pub fn wifipass_usage() -> String {
    "Использование: <code>/wifipass имя_профиля</code>".to_string()
}

pub fn render_all_passwords(pairs: &[(String, Option<String>)]) -> String {
    if pairs.is_empty() {
        return "<i>Сохранённых Wi-Fi профилей не найдено.</i>".to_string();
    }
    let mut lines = vec!["<b>Пароли Wi-Fi (если доступны):</b>".to_string()];
    for (profile, password) in pairs {
        let rendered = match password {
            Some(pwd) => format!("<code>{}</code>", escape(pwd)),
            None => "<i>Не найден / закрыт</i>".to_string(),
        };
        lines.push(format!("• <code>{}</code>: {rendered}", escape(profile)));
    }
    lines.join("\n")
}

pub fn render_table(rows: &[Record]) -> String {
    if rows.is_empty() {
        return "<i>Таблица пуста.</i>".to_string();
    }
    let mut lines = vec!["<b>Таблица записей:</b>".to_string()];
    for (i, r) in rows.iter().enumerate() {
        lines.push(format!(
            "{}. SSID: <code>{}</code> | IP: <code>{}</code> | Пароль: <code>{}</code> | Прим: <code>{}</code>",
            i + 1,
            escape(&r.name),
            escape(&r.address),
            escape(&r.password),
            escape(&r.note),
        ));
    }
    lines.join("\n")
}

/// Prompt for the field a dialogue state is about to collect, or the
/// terminal confirmation once there is nothing left to ask.
pub fn dialogue_prompt(state: DialogueState) -> &'static str {
    match state {
        DialogueState::Name => "Введите имя сети (SSID) или отправьте /skip, чтобы пропустить.",
        DialogueState::Address => "Введите адрес (IP) или отправьте /skip, чтобы пропустить.",
        DialogueState::Password => "Введите пароль (если есть) или отправьте /skip.",
        DialogueState::Note => "Введите примечание или отправьте /skip.",
        DialogueState::Done => "Запись сохранена в таблицу.",
        DialogueState::Cancelled => "Заполнение отменено.",
    }
}

pub fn fill_intro() -> String {
    format!("<b>Заполнение записи.</b> {}", dialogue_prompt(DialogueState::Name))
}

pub fn skipped(next: DialogueState) -> String {
    match next {
        DialogueState::Done => dialogue_prompt(next).to_string(),
        _ => format!("Пропущено. {}", dialogue_prompt(next)),
    }
}

pub fn no_active_fill() -> String {
    "Нет активного заполнения. Начните с команды /fill.".to_string()
}

pub fn storage_failure() -> String {
    "Не удалось сохранить запись. Попробуйте ещё раз или отправьте /cancel.".to_string()
}

pub fn table_read_failure() -> String {
    "Не удалось прочитать таблицу.".to_string()
}

pub fn internal_error() -> String {
    "Внутренняя ошибка. Попробуйте снова.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_report() -> NetReport {
        NetReport {
            ssid: Some("HomeNet".into()),
            adapter_ip: Some("192.168.1.42".into()),
            gateway: Some("192.168.1.1".into()),
            probed_ip: "192.168.1.42".into(),
        }
    }

    #[test]
    fn report_renders_all_four_lines() {
        let text = render_report(&full_report());
        assert!(text.contains("HomeNet"));
        assert!(text.contains("192.168.1.42"));
        assert!(text.contains("192.168.1.1"));
        assert!(text.contains("метод UDP"));
    }

    #[test]
    fn absent_fields_render_explicit_indicators() {
        let report = NetReport {
            ssid: None,
            adapter_ip: None,
            gateway: None,
            probed_ip: "127.0.0.1".into(),
        };
        let text = render_report(&report);
        assert!(text.contains("Не подключено / не найдено"));
        // Both absent optionals produce their own "not found" line.
        assert_eq!(text.matches("Не найден</i>").count(), 2);
        assert!(text.contains("127.0.0.1"));
    }

    #[test]
    fn ssid_is_html_escaped() {
        let mut report = full_report();
        report.ssid = Some("<b>evil</b>".into());
        let text = render_report(&report);
        assert!(text.contains("&lt;b&gt;evil&lt;/b&gt;"));
        assert!(!text.contains("<b>evil</b>"));
    }

    #[test]
    fn empty_profile_list_has_explicit_empty_state() {
        assert!(render_profiles(&[]).contains("не найдено"));
    }

    #[test]
    fn profile_list_is_bulleted() {
        let text = render_profiles(&["A".into(), "B C".into()]);
        assert!(text.contains("• <code>A</code>"));
        assert!(text.contains("• <code>B C</code>"));
    }

    #[test]
    fn password_absent_mentions_rights() {
        let text = render_password("Office", None);
        assert!(text.contains("Office"));
        assert!(text.contains("права"));
    }

    #[test]
    fn all_passwords_marks_closed_profiles() {
        let pairs = vec![
            ("A".to_string(), Some("p1".to_string())),
            ("B".to_string(), None),
        ];
        let text = render_all_passwords(&pairs);
        assert!(text.contains("p1"));
        assert!(text.contains("Не найден / закрыт"));
    }

    #[test]
    fn empty_table_has_explicit_empty_state() {
        assert!(render_table(&[]).contains("Таблица пуста"));
    }

    #[test]
    fn table_rows_are_numbered_in_order() {
        let rows = vec![
            Record {
                name: "first".into(),
                address: "1.1.1.1".into(),
                password: "Отсутствует".into(),
                note: "n1".into(),
            },
            Record {
                name: "second".into(),
                address: "2.2.2.2".into(),
                password: "pw".into(),
                note: "n2".into(),
            },
        ];
        let text = render_table(&rows);
        let first = text.find("1. SSID: <code>first</code>").unwrap();
        let second = text.find("2. SSID: <code>second</code>").unwrap();
        assert!(first < second);
        assert!(text.contains("Отсутствует"));
    }

    #[test]
    fn prompts_cover_every_state() {
        for state in [
            DialogueState::Name,
            DialogueState::Address,
            DialogueState::Password,
            DialogueState::Note,
            DialogueState::Done,
            DialogueState::Cancelled,
        ] {
            assert!(!dialogue_prompt(state).is_empty());
        }
    }

    #[test]
    fn skip_reply_confirms_before_next_prompt() {
        let text = skipped(DialogueState::Address);
        assert!(text.starts_with("Пропущено."));
        assert!(text.contains("адрес"));
        // Skipping the final field goes straight to the saved confirmation.
        assert_eq!(skipped(DialogueState::Done), "Запись сохранена в таблицу.");
    }
}
