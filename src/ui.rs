use crate::board::{ALL_COMPLETE_BANNER, BoardView, GoalView, ProgressView};
use crate::goals::{GoalAction, Transition};
use crate::models::SessionUser;
use serde_json::{Map, Value, json};

pub fn render_login(errors: &[String], username: &str) -> String {
    let errors: String = errors
        .iter()
        .map(|error| format!(r#"<p class="error">{}</p>"#, escape(error)))
        .collect();
    LOGIN_HTML
        .replace("{{ERRORS}}", &errors)
        .replace("{{USERNAME}}", &escape(username))
        .replace("{{STYLE}}", STYLE)
}

pub fn render_dashboard(user: &SessionUser, view: &BoardView) -> String {
    let goals: String = view.goals.iter().map(render_goal).collect();
    let empty = if view.goals.is_empty() {
        r#"<p class="hint">No goals yet.</p>"#
    } else {
        ""
    };
    // Script constants go in before any user text so titles cannot inject them.
    DASHBOARD_HTML
        .replace("{{BANNER}}", &Value::from(ALL_COMPLETE_BANNER).to_string())
        .replace("{{ACTIONS}}", &action_table())
        .replace("{{STYLE}}", STYLE)
        .replace("{{USERNAME}}", &escape(&user.username))
        .replace("{{OVERALL}}", &render_bar(&view.overall))
        .replace("{{GOALS}}", &goals)
        .replace("{{EMPTY}}", empty)
}

/// Script-side copy of the transition table: tag to the label and
/// `data-status` a card takes once the server accepts it, `null` for removal.
fn action_table() -> String {
    let table: Map<String, Value> = GoalAction::ALL
        .into_iter()
        .map(|action| {
            let entry = match action.transition() {
                Transition::SetStatus(status) => json!({
                    "label": status.label(),
                    "status": status.wire_name(),
                }),
                Transition::Remove => Value::Null,
            };
            (action.tag().to_string(), entry)
        })
        .collect();
    Value::Object(table).to_string()
}

fn render_bar(progress: &ProgressView) -> String {
    format!(
        r#"<div class="progress"><div class="progress-bar" style="width: {}">{}</div></div>"#,
        progress.width, progress.label
    )
}

fn render_goal(goal: &GoalView) -> String {
    let tasks: String = goal
        .tasks
        .iter()
        .map(|task| {
            format!(
                r#"<li class="task"><input type="checkbox" id="{id}"{checked} /><label for="{id}"{class}>{title}</label></li>"#,
                id = task.id,
                checked = if task.completed { " checked" } else { "" },
                class = if task.struck_through { r#" class="completed""# } else { "" },
                title = escape(&task.title),
            )
        })
        .collect();
    let menu: String = GoalAction::ALL
        .into_iter()
        .map(|action| {
            format!(
                r##"<li><a class="dropdown-item" href="#" aria-label="{}">{}</a></li>"##,
                action.tag(),
                action.menu_label()
            )
        })
        .collect();
    let (banner, banner_class) = match goal.banner {
        Some(text) => (text, " text-success"),
        None => ("", ""),
    };

    format!(
        r#"<article class="card" data-status="{status}" data-title="{title}">
  <h3 id="card-title" goal-id="{id}">{title}</h3>
  <p class="goal-status">{label}</p>
  <ul class="menu">{menu}</ul>
  {bar}
  <ul class="tasks">{tasks}</ul>
  <p class="task-status{banner_class}">{banner}</p>
</article>
"#,
        status = goal.status.wire_name(),
        title = escape(&goal.title),
        id = goal.id,
        label = goal.status_label,
        bar = render_bar(&goal.progress),
    )
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = r#"
    * { box-sizing: border-box; }
    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, #eef3fb, #f9fbff 60%);
      color: #1f2a37;
      font-family: "Segoe UI", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }
    .app { width: min(960px, 100%); margin: 0 auto; display: grid; gap: 24px; }
    header { display: flex; justify-content: space-between; align-items: center; }
    h1 { margin: 0; color: #0d6efd; }
    .card {
      background: white;
      border-radius: 16px;
      padding: 20px;
      box-shadow: 0 12px 32px rgba(13, 110, 253, 0.12);
      display: grid;
      gap: 10px;
    }
    .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 18px; }
    .progress { background: #e9ecef; border-radius: 999px; overflow: hidden; height: 20px; }
    .progress-bar { background: #198754; color: white; height: 100%; font-size: 0.8rem; text-align: center; }
    .tasks, .menu { list-style: none; margin: 0; padding: 0; }
    .menu { display: flex; flex-wrap: wrap; gap: 8px; font-size: 0.85rem; }
    .completed { text-decoration: line-through; color: #6c757d; }
    .text-success { color: #198754; }
    .error { color: #c63b2b; margin: 0; }
    .hint { color: #6c757d; }
    form.login { display: grid; gap: 12px; max-width: 420px; margin: 0 auto; }
    input[type="text"], input[type="password"] { padding: 10px; border-radius: 8px; border: 1px solid #ced4da; }
    button { padding: 10px 16px; border: none; border-radius: 8px; background: #198754; color: white; cursor: pointer; }
    .toast {
      position: fixed;
      right: 24px;
      bottom: 24px;
      padding: 12px 18px;
      border-radius: 10px;
      background: #1f2a37;
      color: white;
      box-shadow: 0 8px 24px rgba(0, 0, 0, 0.2);
    }
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Elevate: Login Page</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app card">
    <header><h1>WELCOME TO ELEVATE</h1></header>
    {{ERRORS}}
    <form class="login" action="/login" method="post">
      <label for="username">Username</label>
      <input type="text" name="username" id="username" value="{{USERNAME}}" required />
      <label for="password">Password</label>
      <input type="password" name="password" id="password" required />
      <button type="submit" id="loginButton">Login</button>
    </form>
  </main>
</body>
</html>
"#;

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Elevate: Goals</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Hi, {{USERNAME}}</h1>
      <form method="post" action="/logout"><button type="submit">Log out</button></form>
    </header>
    <section id="overall">{{OVERALL}}</section>
    <nav class="menu">
      <button class="filter-btn" data-filter="*">All</button>
      <button class="filter-btn" data-filter="[data-status=IN_PROGRESS]">In progress</button>
      <button class="filter-btn" data-filter="[data-status=COMPLETED]">Completed</button>
      <button class="filter-btn" data-filter="[data-status=ON_HOLD]">On hold</button>
      <button class="filter-btn" data-filter="[data-status=MISSED]">Missed</button>
      <a class="dropdown-item" href="#" data-sort-by="original-order">Original order</a>
      <a class="dropdown-item" href="#" data-sort-by="title">Title</a>
    </nav>
    {{EMPTY}}
    <section class="grid row">{{GOALS}}</section>
  </main>
  <div id="toast" class="toast" role="status" hidden></div>

  <script src="https://unpkg.com/isotope-layout@3/dist/isotope.pkgd.min.js"></script>
  <script>
    const BANNER = {{BANNER}};
    const ACTIONS = {{ACTIONS}};
    let iso = null;
    let toastTimer = null;

    const showToast = (message) => {
      const toast = document.getElementById('toast');
      if (!toast || !message) return;
      toast.textContent = message;
      toast.hidden = false;
      clearTimeout(toastTimer);
      toastTimer = setTimeout(() => { toast.hidden = true; }, 3000);
    };

    document.addEventListener('DOMContentLoaded', () => {
      if (typeof Isotope === 'undefined') {
        console.error('Isotope failed to load; filter and sort are disabled');
        return;
      }
      iso = new Isotope('.row', {
        itemSelector: '.card',
        layoutMode: 'fitRows',
        getSortData: { title: '[data-title]' },
      });
      document.querySelectorAll('.filter-btn[data-filter]').forEach((button) => {
        button.addEventListener('click', () => {
          iso.arrange({ filter: button.dataset.filter });
        });
      });
      document.querySelectorAll('.dropdown-item[data-sort-by]').forEach((item) => {
        item.addEventListener('click', (event) => {
          event.preventDefault();
          const sortBy = item.dataset.sortBy;
          iso.arrange({ sortBy, sortAscending: sortBy === 'original-order' });
        });
      });
    });

    const setBar = (bar, done, total) => {
      if (!bar) return;
      const pct = total === 0 ? 0 : (done / total) * 100;
      bar.style.width = `${pct}%`;
      bar.textContent = `${Math.floor(pct)}%`;
    };

    const refreshProgress = () => {
      const boxes = document.querySelectorAll('.task input[type="checkbox"]');
      const checked = document.querySelectorAll('.task input[type="checkbox"]:checked');
      setBar(document.querySelector('#overall .progress-bar'), checked.length, boxes.length);
      document.querySelectorAll('article.card').forEach((card) => {
        const all = card.querySelectorAll('.task input[type="checkbox"]');
        const done = card.querySelectorAll('.task input[type="checkbox"]:checked');
        setBar(card.querySelector('.progress-bar'), done.length, all.length);
        const status = card.querySelector('.task-status');
        const complete = done.length === all.length;
        status.textContent = complete ? BANNER : '';
        status.classList.toggle('text-success', complete);
      });
    };

    document.querySelectorAll('.task input[type="checkbox"]').forEach((box) => {
      box.addEventListener('change', async () => {
        const wanted = box.checked;
        box.checked = !wanted;
        try {
          const res = await fetch('/api/tasks/update', {
            method: 'POST',
            headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
            body: `task_id=${box.id}&completed=${wanted ? 1 : 0}`,
          });
          const data = await res.json();
          if (data.status !== 'success') {
            console.error('Error updating task status', data.message);
            return;
          }
          if (!box.isConnected) return;
          box.checked = wanted;
          box.nextElementSibling.classList.toggle('completed', wanted);
          refreshProgress();
        } catch (err) {
          console.error('Error:', err);
        }
      });
    });

    document.querySelectorAll('.card .dropdown-item[aria-label]').forEach((item) => {
      item.addEventListener('click', async (event) => {
        event.preventDefault();
        const card = item.closest('.card');
        const action = item.getAttribute('aria-label');
        const goalId = card.querySelector('#card-title').getAttribute('goal-id');
        try {
          const res = await fetch('/api/goals/action', {
            method: 'POST',
            headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
            body: `action=${encodeURIComponent(action)}&goalId=${goalId}`,
          });
          const data = await res.json();
          if (!data.success) {
            alert(`Error: ${data.error}`);
            return;
          }
          showToast(data.message);
          if (!card.isConnected) return;
          const next = ACTIONS[action];
          if (!next) {
            if (iso) {
              iso.remove(card);
              iso.layout();
            } else {
              card.remove();
            }
            refreshProgress();
          } else {
            card.querySelector('.goal-status').textContent = next.label;
            card.dataset.status = next.status;
            if (iso) {
              iso.updateSortData(card);
              iso.arrange();
            }
          }
        } catch (err) {
          console.error('Error:', err);
        }
      });
    });
  </script>
</body>
</html>
"##;
