//! Server-rendered HTML pages
//!
//! Pages are plain `format!` templates. Every user-supplied value goes
//! through `escape_html` except note bodies, which are stored as HTML and
//! rendered as such.

use crate::database::{NoteWithTags, Summary};
use crate::services::{DraftContent, SummarizeOutcome};
use crate::text::{escape_html, human_time};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 860px; margin: 0 auto; padding: 1rem; background: #fdf8f3; color: #333; }
nav { display: flex; gap: 1rem; align-items: center; margin-bottom: 1.5rem; }
nav .user { margin-left: auto; color: #777; }
form.stack { display: flex; flex-direction: column; gap: .5rem; margin-bottom: 1.5rem; }
input[type=text], input[type=password], textarea { padding: .4rem; font: inherit; }
textarea { min-height: 8rem; }
.note { background: #fff; border-radius: 6px; padding: .75rem 1rem; margin-bottom: 1rem; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.note.pinned { border-left: 4px solid #e0a030; }
.note h2 { margin: 0 0 .25rem; font-size: 1.2rem; }
.meta { color: #888; font-size: .85rem; }
.tag { background: #eee; border-radius: 3px; padding: 0 .35rem; margin-right: .25rem; }
.actions a, .actions button { margin-right: .5rem; }
.error { color: #b00020; }
#timer { font-size: 4rem; text-align: center; margin: 2rem 0; }
"#;

const NOTES_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', () => {
  const form = document.getElementById('addForm');
  if (form) {
    const title = document.getElementById('titleInput');
    const content = document.getElementById('contentInput');
    let timer = null;
    const save = () => {
      if (timer) clearTimeout(timer);
      timer = setTimeout(() => {
        fetch('/draft', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ title: title.value, content: content.value })
        }).catch(() => {});
      }, 700);
    };
    [title, content].forEach(el => el.addEventListener('input', save));
  }
  document.querySelectorAll('.toggle-pin').forEach(btn => {
    btn.addEventListener('click', () => {
      fetch(`/toggle_pin/${btn.dataset.id}`, { method: 'POST' })
        .then(r => r.json())
        .then(() => window.location.reload());
    });
  });
});
"#;

const POMODORO_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', () => {
  const modes = { focus: 25 * 60, short: 5 * 60, long: 15 * 60 };
  const display = document.getElementById('timer');
  let remaining = modes.focus;
  let handle = null;
  const render = () => {
    const m = Math.floor(remaining / 60).toString().padStart(2, '0');
    const s = (remaining % 60).toString().padStart(2, '0');
    display.textContent = `${m}:${s}`;
  };
  const stop = () => { clearInterval(handle); handle = null; };
  document.getElementById('startBtn').addEventListener('click', () => {
    if (handle) return;
    handle = setInterval(() => {
      remaining = Math.max(0, remaining - 1);
      render();
      if (remaining === 0) { stop(); alert('Time is up!'); }
    }, 1000);
  });
  document.getElementById('pauseBtn').addEventListener('click', stop);
  document.querySelectorAll('.mode').forEach(btn => {
    btn.addEventListener('click', () => { stop(); remaining = modes[btn.dataset.mode]; render(); });
  });
  render();
});
"#;

fn nav(username: Option<&str>) -> String {
    match username {
        Some(name) => format!(
            r#"<nav><a href="/notes">Notes</a><a href="/summaries">Summaries</a><a href="/pomodoro">Pomodoro</a><a href="/export/txt">Export TXT</a><a href="/export/pdf">Export PDF</a><span class="user">{}</span><a href="/logout">Logout</a></nav>"#,
            escape_html(name)
        ),
        None => r#"<nav><a href="/login">Login</a><a href="/register">Register</a></nav>"#
            .to_string(),
    }
}

fn layout(title: &str, username: Option<&str>, body: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title} - Notekeeper</title>
<style>{style}</style>
</head>
<body>
{nav}
{body}
<script>{script}</script>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        nav = nav(username),
        body = body,
        script = script,
    )
}

fn credentials_form(action: &str, button: &str) -> String {
    format!(
        r#"<form class="stack" method="post" action="{action}">
<input type="text" name="username" placeholder="Username" required>
<input type="password" name="password" placeholder="Password" required>
<button type="submit">{button}</button>
</form>"#
    )
}

pub fn login_page() -> String {
    let body = format!(
        "<h1>Login</h1>{}<p>No account? <a href=\"/register\">Register</a></p>",
        credentials_form("/login", "Login")
    );
    layout("Login", None, &body, "")
}

pub fn register_page() -> String {
    let body = format!(
        "<h1>Register</h1>{}<p>Already registered? <a href=\"/login\">Login</a></p>",
        credentials_form("/register", "Create account")
    );
    layout("Register", None, &body, "")
}

/// Current search and tag filters shown on the notes page
#[derive(Debug, Default)]
pub struct NoteFilters<'a> {
    pub query: &'a str,
    pub tag: &'a str,
}

fn note_card(n: &NoteWithTags, now: DateTime<Utc>) -> String {
    let mut tags = String::new();
    for t in &n.tags {
        let _ = write!(
            tags,
            r#"<a class="tag" href="/notes?tag={}">{}</a>"#,
            escape_html(t),
            escape_html(t)
        );
    }

    format!(
        r#"<div class="note{pinned_class}">
<h2>{title}</h2>
<div class="meta">{tags} updated {updated}</div>
<div class="content">{content}</div>
<div class="actions">
<button class="toggle-pin" data-id="{id}">{pin_label}</button>
<a href="/edit/{id}">Edit</a>
<a href="/summarize/{id}">Summarize</a>
<a href="/delete/{id}" onclick="return confirm('Delete this note?')">Delete</a>
</div>
</div>"#,
        pinned_class = if n.note.pinned { " pinned" } else { "" },
        title = escape_html(&n.note.title),
        tags = tags,
        updated = human_time(n.note.updated_at, now),
        content = n.note.content,
        id = n.note.id,
        pin_label = if n.note.pinned { "Unpin" } else { "Pin" },
    )
}

pub fn notes_page(
    username: &str,
    notes: &[NoteWithTags],
    tags: &[(String, i64)],
    draft: &DraftContent,
    filters: &NoteFilters<'_>,
    now: DateTime<Utc>,
) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<h1>Your notes</h1>
<form id="addForm" class="stack" method="post" action="/notes">
<input id="titleInput" type="text" name="title" placeholder="Title" value="{}">
<textarea id="contentInput" name="content" placeholder="Write something...">{}</textarea>
<input type="text" name="tags" placeholder="Tags, comma separated">
<label><input type="checkbox" name="pinned" value="on"> Pin</label>
<button type="submit">Save note</button>
</form>
<form method="get" action="/notes">
<input type="text" name="q" placeholder="Search" value="{}">
<input type="hidden" name="tag" value="{}">
<button type="submit">Search</button>
</form>"#,
        escape_html(&draft.title),
        escape_html(&draft.content),
        escape_html(filters.query),
        escape_html(filters.tag),
    );

    if !tags.is_empty() {
        body.push_str("<p>");
        for (name, count) in tags {
            let _ = write!(
                body,
                r#"<a class="tag" href="/notes?tag={}">{} ({})</a>"#,
                escape_html(name),
                escape_html(name),
                count
            );
        }
        if !filters.tag.is_empty() {
            body.push_str(r#" <a href="/notes">clear filter</a>"#);
        }
        body.push_str("</p>");
    }

    if notes.is_empty() {
        body.push_str("<p class=\"meta\">No notes found.</p>");
    }
    for n in notes {
        body.push_str(&note_card(n, now));
    }

    layout("Notes", Some(username), &body, NOTES_SCRIPT)
}

pub fn edit_page(username: &str, note: &NoteWithTags, now: DateTime<Utc>) -> String {
    let body = format!(
        r#"<h1>Edit note</h1>
<p class="meta">Last updated {updated}</p>
<form class="stack" method="post" action="/edit/{id}">
<input type="text" name="title" value="{title}">
<textarea name="content">{content}</textarea>
<input type="text" name="tags" value="{tags}" placeholder="Tags, comma separated">
<label><input type="checkbox" name="pinned" value="on"{checked}> Pin</label>
<button type="submit">Save</button>
<a href="/notes">Cancel</a>
</form>"#,
        updated = human_time(note.note.updated_at, now),
        id = note.note.id,
        title = escape_html(&note.note.title),
        content = escape_html(&note.note.content),
        tags = escape_html(&note.tags.join(", ")),
        checked = if note.note.pinned { " checked" } else { "" },
    );

    layout("Edit note", Some(username), &body, "")
}

pub fn summarize_page(username: &str, outcome: &SummarizeOutcome) -> String {
    let note = outcome
        .note()
        .map(|n| format!("<h2>{}</h2><div class=\"note\">{}</div>", escape_html(&n.title), n.content))
        .unwrap_or_default();

    let class = if outcome.is_error() { "error" } else { "summary" };
    let body = format!(
        r#"<h1>Summary</h1>{note}<p class="{class}">{text}</p><p><a href="/summaries">All summaries</a> | <a href="/notes">Back to notes</a></p>"#,
        text = escape_html(outcome.display_text()),
    );

    layout("Summary", Some(username), &body, "")
}

pub fn summaries_page(username: &str, summaries: &[Summary]) -> String {
    let mut body = String::from("<h1>Summaries</h1>");

    if summaries.is_empty() {
        body.push_str("<p class=\"meta\">No summaries yet.</p>");
    }
    for s in summaries {
        let _ = write!(
            body,
            r#"<div class="note"><h2><a href="/summary/{}">{}</a></h2><p>{}</p></div>"#,
            s.id,
            escape_html(&s.title),
            escape_html(&s.summary)
        );
    }

    layout("Summaries", Some(username), &body, "")
}

pub fn summary_page(username: &str, summary: &Summary) -> String {
    let body = format!(
        r#"<h1>{}</h1><p>{}</p><p><a href="/summaries">Back to summaries</a></p>"#,
        escape_html(&summary.title),
        escape_html(&summary.summary)
    );

    layout(&summary.title, Some(username), &body, "")
}

pub fn pomodoro_page(username: &str) -> String {
    let body = r#"<h1>Pomodoro</h1>
<div>
<button class="mode" data-mode="focus">Focus</button>
<button class="mode" data-mode="short">Short break</button>
<button class="mode" data-mode="long">Long break</button>
</div>
<div id="timer">25:00</div>
<div><button id="startBtn">Start</button> <button id="pauseBtn">Pause</button></div>"#;

    layout("Pomodoro", Some(username), body, POMODORO_SCRIPT)
}
