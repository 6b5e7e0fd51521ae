//! Built-in deterministic module renderer.
//!
//! The last tier: always succeeds, no network, dark-panel layout with a
//! three-meter sidebar and a round-by-round decision loop driven by the
//! blueprint's own rounds.

use playforge_core::text::escape_html;
use serde_json::json;

use crate::job::RenderJob;

struct Theme {
    label: &'static str,
    background: &'static str,
    accent: &'static str,
    accent_soft: &'static str,
    panel: &'static str,
    keywords: &'static [&'static str],
}

const THEMES: &[Theme] = &[
    Theme {
        label: "Imperial Simulation",
        background: "radial-gradient(circle at 10% 12%, rgba(251, 191, 36, 0.14), transparent 34%), radial-gradient(circle at 90% 8%, rgba(239, 68, 68, 0.2), transparent 36%), #120b0b",
        accent: "#f59e0b",
        accent_soft: "rgba(245, 158, 11, 0.28)",
        panel: "rgba(30, 14, 14, 0.88)",
        keywords: &[
            "皇", "帝", "朝", "税", "历史", "王朝", "宫廷", "儒", "官僚", "empire", "dynasty",
            "imperial", "throne", "kingdom",
        ],
    },
    Theme {
        label: "Business War Room",
        background: "radial-gradient(circle at 12% 10%, rgba(20, 184, 166, 0.16), transparent 35%), radial-gradient(circle at 88% 10%, rgba(14, 165, 233, 0.2), transparent 35%), #07111a",
        accent: "#14b8a6",
        accent_soft: "rgba(20, 184, 166, 0.26)",
        panel: "rgba(8, 23, 31, 0.88)",
        keywords: &[
            "创业", "公司", "产品", "垄断", "竞争", "市场", "商业", "战略", "增长", "startup",
            "company", "market", "business", "growth", "strategy",
        ],
    },
    Theme {
        label: "Research Mission Hub",
        background: "radial-gradient(circle at 14% 12%, rgba(96, 165, 250, 0.2), transparent 33%), radial-gradient(circle at 90% 10%, rgba(59, 130, 246, 0.18), transparent 36%), #060c19",
        accent: "#60a5fa",
        accent_soft: "rgba(96, 165, 250, 0.26)",
        panel: "rgba(10, 17, 37, 0.88)",
        keywords: &[
            "论文", "研究", "实验", "模型", "科学", "数据", "假设", "research", "experiment",
            "hypothesis", "science", "study",
        ],
    },
    Theme {
        label: "Policy Sandbox",
        background: "radial-gradient(circle at 14% 12%, rgba(167, 139, 250, 0.18), transparent 34%), radial-gradient(circle at 88% 9%, rgba(99, 102, 241, 0.2), transparent 36%), #0a0b1c",
        accent: "#a78bfa",
        accent_soft: "rgba(167, 139, 250, 0.24)",
        panel: "rgba(18, 15, 41, 0.88)",
        keywords: &[
            "政策", "财政", "债务", "宏观", "经济", "货币", "制度", "policy", "fiscal", "debt",
            "monetary", "economy", "treasury",
        ],
    },
];

fn pick_theme(job: &RenderJob) -> &'static Theme {
    let probe = format!(
        "{} {} {} {}",
        job.book_title, job.opening, job.module.title, job.module.situation
    )
    .to_lowercase();
    THEMES
        .iter()
        .find(|theme| theme.keywords.iter().any(|k| probe.contains(k)))
        // Research reads neutrally for anything unclassified.
        .unwrap_or(&THEMES[2])
}

/// Render the fallback document. Always a complete single-file page.
pub fn render_template(job: &RenderJob) -> String {
    let theme = pick_theme(job);
    let rounds_json = json!(
        job.module
            .rounds
            .iter()
            .map(|round| {
                json!({
                    "prompt": round.prompt,
                    "situation": round.situation,
                    "options": round.options.iter().map(|option| json!({
                        "label": option.label,
                        "feedback": option.feedback,
                        "effects": {
                            "stability": option.effects.stability,
                            "resource": option.effects.resource,
                            "progress": option.effects.progress,
                        },
                    })).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>()
    )
    .to_string()
    // A literal `</script>` inside the embedded JSON would end the block early.
    .replace("</", "<\\/");

    let title = escape_html(&job.module.title);
    let book_title = escape_html(&job.book_title);
    let opening = escape_html(&job.opening);
    let objective = escape_html(&job.objective);
    let situation = escape_html(&job.module.situation);
    let debrief = escape_html(&job.debrief);
    let theme_label = theme.label;
    let position = format!("{} / {}", job.module_index + 1, job.module_count);

    let intel_html: String = job
        .intel
        .iter()
        .take(4)
        .map(|line| format!("<li>{}</li>", escape_html(line)))
        .collect();
    let intel_html = if intel_html.is_empty() {
        "<li>Identify constraints first, then compare payoffs.</li>".to_string()
    } else {
        intel_html
    };

    let next_href = job.next_href();
    let prev_href = job.prev_href();
    let hub_href = job.hub_href();

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{book_title} · {title}</title>
  <style>
    :root {{
      color-scheme: dark;
      --panel: {panel};
      --line: rgba(148, 163, 184, 0.24);
      --text: #edf4ff;
      --sub: #afc5e2;
      --accent: {accent};
      --accent-soft: {accent_soft};
    }}
    * {{ box-sizing: border-box; }}
    body {{
      margin: 0;
      min-height: 100vh;
      font-family: "Noto Sans SC", "PingFang SC", "Helvetica Neue", Arial, sans-serif;
      color: var(--text);
      background: {background};
    }}
    .page {{
      width: min(1160px, calc(100% - 24px));
      margin: 0 auto;
      padding: 22px 0 36px;
      display: grid;
      grid-template-columns: minmax(280px, 330px) minmax(0, 1fr);
      gap: 14px;
    }}
    .panel {{
      border: 1px solid var(--line);
      background: var(--panel);
      border-radius: 14px;
      padding: 14px;
      box-shadow: 0 18px 42px rgba(2, 8, 20, 0.46);
    }}
    .hero {{
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 14px;
      background: linear-gradient(160deg, var(--accent-soft), rgba(15, 23, 42, 0.62));
    }}
    .chip-row {{ display: flex; gap: 7px; flex-wrap: wrap; }}
    .chip {{
      border: 1px solid rgba(148, 163, 184, 0.34);
      border-radius: 999px;
      padding: 4px 10px;
      font-size: 11px;
      color: #deebff;
      font-weight: 700;
      background: rgba(2, 6, 23, 0.45);
    }}
    .hero h1 {{ margin: 10px 0 0; font-size: clamp(24px, 3vw, 34px); letter-spacing: -0.02em; }}
    .hero .sub {{ margin-top: 8px; color: #d4e8ff; line-height: 1.72; font-size: 14px; }}
    .side h2 {{ margin: 0; font-size: 16px; }}
    .small {{ margin-top: 7px; color: var(--sub); font-size: 12px; line-height: 1.6; }}
    .stat {{ margin-top: 9px; }}
    .stat label {{ display: flex; justify-content: space-between; color: #cfe3fc; font-size: 12px; margin-bottom: 4px; }}
    .bar {{ width: 100%; height: 9px; border-radius: 999px; overflow: hidden; background: rgba(148, 163, 184, 0.2); }}
    .fill {{ height: 100%; width: 50%; transition: width 220ms ease; }}
    .fill.s {{ background: linear-gradient(90deg, #34d399, #10b981); }}
    .fill.t {{ background: linear-gradient(90deg, #f59e0b, #f97316); }}
    .fill.r {{ background: linear-gradient(90deg, #60a5fa, #3b82f6); }}
    .intel, .log {{ margin-top: 12px; border-top: 1px solid var(--line); padding-top: 10px; }}
    .intel ul, .log ul {{
      margin: 8px 0 0;
      padding-left: 18px;
      color: #d7e9ff;
      font-size: 13px;
      display: grid;
      gap: 6px;
      line-height: 1.62;
    }}
    .log ul {{ max-height: 180px; overflow: auto; padding-right: 6px; }}
    .main {{
      border: 1px solid var(--line);
      border-radius: 14px;
      background: rgba(11, 18, 34, 0.88);
      padding: 14px;
      box-shadow: 0 20px 50px rgba(2, 8, 20, 0.48);
    }}
    .scenario {{ margin-top: 14px; border: 1px solid var(--line); border-radius: 12px; background: rgba(15, 23, 42, 0.76); padding: 12px; }}
    .scenario h3 {{ margin: 0; font-size: 17px; }}
    .situation {{ margin-top: 8px; font-size: 14px; color: #d8e9ff; line-height: 1.7; }}
    .prompt {{ margin-top: 8px; font-size: 14px; color: #eff6ff; font-weight: 700; line-height: 1.7; }}
    .options {{ margin-top: 10px; display: grid; grid-template-columns: 1fr 1fr; gap: 10px; }}
    .opt-btn {{
      text-align: left;
      border: 1px solid rgba(148, 163, 184, 0.36);
      border-radius: 12px;
      background: rgba(15, 23, 42, 0.92);
      color: #e2eeff;
      padding: 11px;
      cursor: pointer;
      display: grid;
      gap: 6px;
      transition: border-color 140ms ease, transform 140ms ease;
    }}
    .opt-btn:hover {{ transform: translateY(-1px); border-color: rgba(56, 189, 248, 0.78); }}
    .opt-label {{ font-size: 14px; font-weight: 700; line-height: 1.5; }}
    .opt-effect {{ font-size: 12px; color: #9fc0e9; }}
    .report {{ margin-top: 10px; min-height: 22px; color: #9ad8ff; font-size: 13px; line-height: 1.65; }}
    .debrief {{ margin-top: 14px; border-top: 1px solid var(--line); padding-top: 10px; display: none; }}
    .debrief.show {{ display: block; }}
    .debrief p {{ color: #d8ebff; font-size: 13px; line-height: 1.7; margin: 0; }}
    .end-actions {{ margin-top: 12px; display: none; gap: 8px; flex-wrap: wrap; }}
    .end-actions.show {{ display: flex; }}
    .btn {{
      border: 1px solid rgba(148, 163, 184, 0.36);
      border-radius: 10px;
      padding: 9px 12px;
      background: rgba(30, 41, 59, 0.82);
      color: #e2edff;
      text-decoration: none;
      font-size: 13px;
      font-weight: 700;
      cursor: pointer;
    }}
    .btn.primary {{ border-color: rgba(34, 211, 238, 0.66); background: rgba(8, 145, 178, 0.34); }}
    @media (max-width: 960px) {{
      .page {{ grid-template-columns: 1fr; }}
      .options {{ grid-template-columns: 1fr; }}
    }}
  </style>
</head>
<body>
  <main class="page">
    <aside class="panel side">
      <h2>{book_title}</h2>
      <p class="small">{position} · {title}</p>
      <p class="small">Objective: {objective}</p>

      <div class="stat">
        <label><span>System Stability</span><span id="s-v">50</span></label>
        <div class="bar"><div id="s-b" class="fill s"></div></div>
      </div>
      <div class="stat">
        <label><span>Resource Vitality</span><span id="t-v">50</span></label>
        <div class="bar"><div id="t-b" class="fill t"></div></div>
      </div>
      <div class="stat">
        <label><span>Structural Progress</span><span id="r-v">50</span></label>
        <div class="bar"><div id="r-b" class="fill r"></div></div>
      </div>

      <section class="intel">
        <h2>Intel Cards</h2>
        <ul>{intel_html}</ul>
      </section>

      <section class="log">
        <h2>Event Log</h2>
        <ul id="event-log"></ul>
      </section>
    </aside>

    <section class="main">
      <header class="hero">
        <div class="chip-row">
          <span class="chip">{theme_label}</span>
          <span class="chip">Mission {mission_number}</span>
        </div>
        <h1>{title}</h1>
        <p class="sub">{opening}</p>
        <p class="sub">{situation}</p>
      </header>

      <article class="scenario">
        <h3 id="round-title">Loading</h3>
        <p id="round-situation" class="situation">Preparing the scenario.</p>
        <p id="round-prompt" class="prompt">One moment.</p>
        <div id="options" class="options"></div>
      </article>

      <p id="report" class="report"></p>

      <div id="debrief" class="debrief">
        <p>{debrief}</p>
      </div>
      <div id="end-actions" class="end-actions">
        <a class="btn primary" href="{next_href}">Next Scene</a>
        <a class="btn" href="{prev_href}">Previous Scene</a>
        <a class="btn" href="{hub_href}">Back to Book Hub</a>
        <button id="retry-btn" class="btn" type="button">Restart Module</button>
      </div>
    </section>
  </main>

  <script>
    (() => {{
      const rounds = {rounds_json};
      const state = {{ i: 0, stability: 50, resource: 50, progress: 50 }};
      const titleEl = document.getElementById("round-title");
      const situationEl = document.getElementById("round-situation");
      const promptEl = document.getElementById("round-prompt");
      const optionsEl = document.getElementById("options");
      const reportEl = document.getElementById("report");
      const logEl = document.getElementById("event-log");
      const debriefEl = document.getElementById("debrief");
      const endActionsEl = document.getElementById("end-actions");
      const retryBtn = document.getElementById("retry-btn");
      const meters = {{
        stability: [document.getElementById("s-v"), document.getElementById("s-b")],
        resource: [document.getElementById("t-v"), document.getElementById("t-b")],
        progress: [document.getElementById("r-v"), document.getElementById("r-b")]
      }};

      function clampMeter(v) {{
        return Math.max(0, Math.min(100, Math.round(v)));
      }}

      function fmtDelta(v, label) {{
        const n = Number(v) || 0;
        return label + " " + (n > 0 ? "+" : "") + n;
      }}

      function refreshBars() {{
        for (const key of Object.keys(meters)) {{
          meters[key][0].textContent = String(state[key]);
          meters[key][1].style.width = state[key] + "%";
        }}
      }}

      function pushLog(text) {{
        const li = document.createElement("li");
        li.textContent = text;
        logEl.prepend(li);
        while (logEl.children.length > 8) {{
          logEl.removeChild(logEl.lastChild);
        }}
      }}

      function showFinal() {{
        titleEl.textContent = "Scene Debrief";
        situationEl.textContent = "You completed all critical decisions in this module.";
        promptEl.textContent = "Review your log and check whether your causal logic stayed consistent.";
        optionsEl.innerHTML = "";
        debriefEl.classList.add("show");
        endActionsEl.classList.add("show");
      }}

      function applyChoice(option) {{
        const effects = option.effects || {{}};
        state.stability = clampMeter(state.stability + (Number(effects.stability) || 0));
        state.resource = clampMeter(state.resource + (Number(effects.resource) || 0));
        state.progress = clampMeter(state.progress + (Number(effects.progress) || 0));
        refreshBars();
        pushLog((option.label || "Decision") + " → " + [
          fmtDelta(effects.stability, "STB"),
          fmtDelta(effects.resource, "RSC"),
          fmtDelta(effects.progress, "PRG")
        ].join(" · "));
        reportEl.textContent = option.feedback || "You completed a critical decision.";
        state.i += 1;
        paintRound();
      }}

      function paintRound() {{
        const round = rounds[state.i];
        if (!round) {{
          showFinal();
          return;
        }}
        titleEl.textContent = "Decision " + (state.i + 1) + " / " + rounds.length;
        situationEl.textContent = round.situation || "The situation is changing.";
        promptEl.textContent = round.prompt || "";
        optionsEl.innerHTML = "";
        for (const option of round.options || []) {{
          const btn = document.createElement("button");
          btn.className = "opt-btn";
          btn.type = "button";
          const label = document.createElement("span");
          label.className = "opt-label";
          label.textContent = option.label || "Unnamed strategy";
          const effect = document.createElement("span");
          effect.className = "opt-effect";
          effect.textContent = [
            fmtDelta(option.effects && option.effects.stability, "STB"),
            fmtDelta(option.effects && option.effects.resource, "RSC"),
            fmtDelta(option.effects && option.effects.progress, "PRG")
          ].join(" · ");
          btn.appendChild(label);
          btn.appendChild(effect);
          btn.addEventListener("click", () => applyChoice(option));
          optionsEl.appendChild(btn);
        }}
      }}

      retryBtn.addEventListener("click", () => {{
        state.i = 0;
        state.stability = 50;
        state.resource = 50;
        state.progress = 50;
        refreshBars();
        reportEl.textContent = "";
        debriefEl.classList.remove("show");
        endActionsEl.classList.remove("show");
        logEl.innerHTML = "";
        paintRound();
      }});

      refreshBars();
      paintRound();
    }})();
  </script>
</body>
</html>
"#,
        panel = theme.panel,
        accent = theme.accent,
        accent_soft = theme.accent_soft,
        background = theme.background,
        mission_number = job.module_index + 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use playforge_core::blueprint::{Blueprint, ChoiceOption, Effects, ModulePlan, Round};

    fn job(book_title: &str, opening: &str) -> RenderJob {
        let blueprint = Blueprint {
            book_title: book_title.into(),
            opening_narrative: opening.into(),
            learning_objective: "Weigh trade-offs under pressure.".into(),
            background_intel: vec!["Reserves fell by <half>.".into()],
            modules: vec![ModulePlan {
                title: "The Levy".into(),
                situation: "The council is split.".into(),
                rounds: vec![Round {
                    prompt: "What is your call?".into(),
                    situation: "Advisors disagree.".into(),
                    options: vec![ChoiceOption {
                        label: "Raise the levy".into(),
                        feedback: "Revenue climbs.".into(),
                        effects: Effects { stability: -4, resource: 6, progress: 2 },
                    }],
                }],
            }],
            debrief: "Every lever moved two meters at once.".into(),
        };
        RenderJob::from_blueprint(&blueprint, "book-1", 0, &["m-1".into()], "", &[])
    }

    #[test]
    fn template_is_a_complete_document() {
        let html = render_template(&job("A Study", "We examine the data."));
        assert!(html.contains("<!doctype html"));
        assert!(html.contains("<body"));
        assert!(html.contains("<script"));
        assert!(html.contains("Raise the levy"));
        assert!(html.contains("/books/book-1.html"));
    }

    #[test]
    fn html_in_fields_is_escaped() {
        let html = render_template(&job("A <Study>", "opening"));
        assert!(html.contains("A &lt;Study&gt;"));
        assert!(html.contains("&lt;half&gt;"));
    }

    #[test]
    fn embedded_json_cannot_close_the_script_block() {
        let mut j = job("T", "o");
        j.module.rounds[0].prompt = "Contains </script> literally".into();
        let html = render_template(&j);
        assert!(!html.contains(r#""Contains </script>"#));
        assert!(html.contains(r#"<\/script>"#));
    }

    #[test]
    fn theme_follows_domain_keywords() {
        let imperial = render_template(&job("明朝那些事", "王朝的税收"));
        assert!(imperial.contains("Imperial Simulation"));

        let business = render_template(&job("Zero to One", "Every startup must escape competition."));
        assert!(business.contains("Business War Room"));

        let default = render_template(&job("Untitled Misc", "plain text"));
        assert!(default.contains("Research Mission Hub"));
    }
}
