use crate::calendar::{CalendarZoom, ZOOM_MAX_WIDTH, ZOOM_MIN_WIDTH, ZOOM_STEP};
use crate::models::AppConfig;
use serde_json::Value;

pub fn render_index(config: &AppConfig) -> String {
    INDEX_HTML
        .replace("{{LANG}}", config.language.code())
        .replace("{{COLOR_VARS}}", &color_vars(config))
        .replace("{{BLUR}}", &format!("{}px", config.blur_strength))
        .replace("{{ZOOM_DEFAULT}}", &CalendarZoom::default().width().to_string())
        .replace("{{ZOOM_MIN}}", &ZOOM_MIN_WIDTH.to_string())
        .replace("{{ZOOM_MAX}}", &ZOOM_MAX_WIDTH.to_string())
        .replace("{{ZOOM_STEP}}", &ZOOM_STEP.to_string())
}

/// `--color-accent-primary: #F48FB1;` lines for every configured color.
fn color_vars(config: &AppConfig) -> String {
    let Ok(Value::Object(colors)) = serde_json::to_value(&config.colors) else {
        return String::new();
    };
    colors
        .iter()
        .filter_map(|(key, value)| value.as_str().map(|color| (key, color)))
        .map(|(key, color)| {
            format!(
                "      --{}: {};\n",
                key.replace('_', "-"),
                escape_css(color)
            )
        })
        .collect()
}

fn escape_css(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>'))
        .collect()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="{{LANG}}">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Love Timer</title>
  <style>
    :root {
{{COLOR_VARS}}      --blur: {{BLUR}};
      --calendar-module-min-width: {{ZOOM_DEFAULT}}px;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--color-background);
      color: var(--color-text);
      font-family: system-ui, sans-serif;
    }

    nav {
      display: flex;
      gap: 8px;
      padding: 12px 16px;
      border-bottom: 1px solid var(--color-divider);
      backdrop-filter: blur(var(--blur));
    }

    nav button {
      background: none;
      border: none;
      color: var(--color-text);
      padding: 8px 12px;
      cursor: pointer;
      border-bottom: 2px solid transparent;
    }

    nav button.active {
      border-bottom-color: var(--color-nav-active-indicator);
      color: var(--color-text-emphasis);
    }

    main {
      max-width: 960px;
      margin: 0 auto;
      padding: 24px 16px;
    }

    .page {
      display: none;
    }

    .page.active {
      display: block;
    }

    .timer {
      border-radius: 16px;
      padding: 16px 20px;
      margin-bottom: 12px;
      background: var(--color-timer-custom-bg);
    }

    .timer[data-id="arrival"] {
      background: var(--color-timer-arrival-bg);
    }

    .timer[data-id="relationship"] {
      background: var(--color-timer-relationship-bg);
    }

    .timer .value {
      font-size: 2rem;
      font-variant-numeric: tabular-nums;
    }

    .timer .value.countdown {
      color: var(--color-timer-countdown);
    }

    .timer .value.elapsed {
      color: var(--color-timer-elapsed);
    }

    .months {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(var(--calendar-module-min-width), 1fr));
      gap: 20px;
    }

    .month h3 {
      text-align: center;
      color: var(--color-text-emphasis);
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 4px;
    }

    .weekday {
      text-align: center;
      font-size: 0.8rem;
      opacity: 0.7;
    }

    .day {
      position: relative;
      aspect-ratio: 1;
      border-radius: 8px;
      display: flex;
      align-items: center;
      justify-content: center;
      background: var(--color-calendar-day-bg);
    }

    .day.padding {
      background: transparent;
    }

    .day.in-range {
      cursor: pointer;
    }

    .day.out-of-range {
      opacity: 0.35;
    }

    .day.marked {
      background: var(--color-calendar-marked-day-bg);
    }

    .day.arrival {
      background: var(--color-arrival-highlight-bg);
    }

    .day .sticker {
      position: absolute;
      font-size: 1.4rem;
    }

    .wheel-wrap {
      position: relative;
      width: 360px;
      height: 360px;
      margin: 0 auto;
    }

    .wheel {
      width: 100%;
      height: 100%;
      border-radius: 50%;
      position: relative;
      box-shadow: 0 0 24px var(--color-glow-shadow);
    }

    .wheel .label {
      position: absolute;
      transform-origin: center;
      white-space: nowrap;
      font-size: 0.85rem;
    }

    .pointer {
      position: absolute;
      top: -10px;
      left: 50%;
      transform: translateX(-50%);
      border: 10px solid transparent;
      border-top-color: var(--color-accent-secondary);
      z-index: 2;
    }

    .options li {
      display: flex;
      gap: 8px;
      margin-bottom: 6px;
    }

    #status {
      min-height: 1.4em;
      margin-top: 12px;
    }

    #status[data-type="error"] {
      color: #ff6b6b;
    }

    textarea {
      width: 100%;
      min-height: 320px;
      font-family: monospace;
    }
  </style>
</head>
<body>
  <nav>
    <button data-page="main" class="active" data-i18n="nav_main">Main</button>
    <button data-page="calendar" data-i18n="nav_calendar">Calendar</button>
    <button data-page="wheel" data-i18n="nav_wheel">Wheel</button>
    <button data-page="settings" data-i18n="nav_settings">Settings</button>
  </nav>
  <main>
    <div id="fatal" hidden></div>

    <section id="page-main" class="page active">
      <div id="timers"></div>
    </section>

    <section id="page-calendar" class="page">
      <div id="months" class="months"></div>
    </section>

    <section id="page-wheel" class="page">
      <div class="wheel-wrap">
        <div class="pointer"></div>
        <div id="wheel" class="wheel"></div>
      </div>
      <p>
        <button id="spin" data-i18n="wheel_spin">Spin</button>
        <span id="wheel-result"></span>
      </p>
      <ul id="options" class="options"></ul>
      <p>
        <input id="new-option" data-i18n-placeholder="wheel_new_option" />
        <button id="add-option" data-i18n="wheel_add_option">Add</button>
        <button id="save-options" data-i18n="wheel_save_options">Save</button>
      </p>
    </section>

    <section id="page-settings" class="page">
      <textarea id="settings"></textarea>
      <p>
        <button id="save-settings" data-i18n="settings_save">Save</button>
        <button id="reset-all" data-i18n="settings_reset_all">Reset everything</button>
      </p>
    </section>

    <div id="status"></div>
  </main>

  <script>
    const MAX_OPTIONS = 30;
    let config = null;
    let lang = {};
    let options = [];
    let saving = false;
    let timerHandle = null;
    let zoomWidth = {{ZOOM_DEFAULT}};

    const setZoom = (width) => {
      zoomWidth = Math.max({{ZOOM_MIN}}, Math.min({{ZOOM_MAX}}, width));
      document.documentElement.style.setProperty('--calendar-module-min-width', `${zoomWidth}px`);
    };

    const statusEl = document.getElementById('status');
    const t = (key) => lang[key] || key;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const request = async (url, init) => {
      const res = await fetch(url, init);
      if (!res.ok) {
        let message = res.statusText;
        try {
          message = (await res.json()).error || message;
        } catch (_) {}
        throw new Error(message);
      }
      return res.json();
    };

    const postJson = (url, body) =>
      request(url, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body || {})
      });

    const applyLang = () => {
      document.querySelectorAll('[data-i18n]').forEach((el) => {
        el.textContent = t(el.dataset.i18n);
      });
      document.querySelectorAll('[data-i18n-placeholder]').forEach((el) => {
        el.placeholder = t(el.dataset.i18nPlaceholder);
      });
    };

    const showPage = (page) => {
      document.querySelectorAll('nav button').forEach((button) => {
        button.classList.toggle('active', button.dataset.page === page);
      });
      document.querySelectorAll('.page').forEach((section) => {
        section.classList.toggle('active', section.id === `page-${page}`);
      });
      if (page === 'calendar') {
        if (!config.calendar_save_zoom) {
          setZoom({{ZOOM_DEFAULT}});
        }
        renderCalendar().catch((err) => setStatus(err.message, 'error'));
      } else if (page === 'wheel') {
        renderWheel().catch((err) => setStatus(err.message, 'error'));
      } else if (page === 'settings') {
        document.getElementById('settings').value = JSON.stringify(config, null, 2);
      }
    };

    const renderTimers = async () => {
      const timers = await request('/api/timers');
      document.getElementById('timers').innerHTML = timers
        .map(
          (timer) => `<div class="timer" data-id="${timer.id}">
            <div class="label"></div>
            <div class="value ${timer.mode}">${timer.text}</div>
          </div>`
        )
        .join('');
      document.querySelectorAll('.timer .label').forEach((el, index) => {
        el.textContent = timers[index].label;
      });
    };

    const renderCalendar = async () => {
      const months = await request('/api/calendar/months');
      const container = document.getElementById('months');
      if (!months.length) {
        container.textContent = t('calendar_out_of_range');
        return;
      }
      container.innerHTML = months
        .map((month) => {
          const header = month.weekday_labels.map((label) => `<div class="weekday">${label}</div>`).join('');
          const days = month.days
            .map((day) => {
              if (day.is_padding) {
                return '<div class="day padding"></div>';
              }
              const classes = ['day', day.is_in_range ? 'in-range' : 'out-of-range'];
              if (day.sticker) classes.push('marked');
              if (day.is_arrival_day) classes.push('arrival');
              const sticker = day.sticker
                ? `<span class="sticker" style="transform:${day.sticker.transform}">${day.sticker.symbol}</span>`
                : '';
              return `<div class="${classes.join(' ')}" data-date="${day.date_string}">${day.day_of_month}${sticker}</div>`;
            })
            .join('');
          return `<div class="month"><h3>${month.title}</h3><div class="grid">${header}${days}</div></div>`;
        })
        .join('');
    };

    const renderWheel = async () => {
      const layout = await request('/api/wheel/sectors');
      const wheel = document.getElementById('wheel');
      wheel.style.background = layout.gradient;
      wheel.innerHTML = layout.sectors
        .map(
          (sector) =>
            `<span class="label" style="left:${sector.left_percent}%;top:${sector.top_percent}%;transform:translate(-50%,-50%) rotate(${sector.rotation_degrees}deg)"></span>`
        )
        .join('');
      wheel.querySelectorAll('.label').forEach((el, index) => {
        el.textContent = layout.sectors[index].label;
      });
      renderOptions();
    };

    const renderOptions = () => {
      const list = document.getElementById('options');
      list.innerHTML = '';
      options.forEach((option) => {
        const item = document.createElement('li');
        const input = document.createElement('input');
        input.value = option.label;
        input.addEventListener('input', () => {
          option.label = input.value;
        });
        const remove = document.createElement('button');
        remove.textContent = '×';
        remove.addEventListener('click', () => {
          options = options.filter((other) => other.id !== option.id);
          renderOptions();
        });
        item.append(input, remove);
        list.append(item);
      });
      document.getElementById('add-option').disabled = options.length >= MAX_OPTIONS;
    };

    const saveConfig = async (next) => {
      if (saving) {
        return;
      }
      saving = true;
      setStatus(t('settings_saving'), 'info');
      try {
        config = await postJson('/api/config', next);
        options = config.wheel_options.slice();
        setStatus('', '');
      } finally {
        saving = false;
      }
    };

    const startTimers = () => {
      clearInterval(timerHandle);
      renderTimers().catch((err) => setStatus(err.message, 'error'));
      timerHandle = setInterval(() => renderTimers().catch(() => {}), 1000);
    };

    document.querySelectorAll('nav button').forEach((button) => {
      button.addEventListener('click', () => showPage(button.dataset.page));
    });

    document.querySelector('main').addEventListener(
      'wheel',
      (event) => {
        const calendar = document.getElementById('page-calendar');
        if (!calendar || !calendar.classList.contains('active') || !event.ctrlKey) return;
        event.preventDefault();
        setZoom(zoomWidth + (event.deltaY < 0 ? {{ZOOM_STEP}} : -{{ZOOM_STEP}}));
      },
      { passive: false }
    );

    document.getElementById('months').addEventListener('click', (event) => {
      const cell = event.target.closest('.day.in-range');
      if (!cell) return;
      postJson('/api/calendar/toggle', { date: cell.dataset.date })
        .then(renderCalendar)
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('spin').addEventListener('click', () => {
      postJson('/api/wheel/spin')
        .then((result) => {
          document.getElementById('wheel').style.transform = `rotate(${result.angle}deg)`;
          document.getElementById('wheel-result').textContent = result.option.label;
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('add-option').addEventListener('click', () => {
      const input = document.getElementById('new-option');
      const label = input.value.trim();
      if (!label || options.length >= MAX_OPTIONS) return;
      options.push({ id: crypto.randomUUID(), label });
      input.value = '';
      renderOptions();
    });

    document.getElementById('save-options').addEventListener('click', () => {
      saveConfig({ ...config, wheel_options: options })
        .then(renderWheel)
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('save-settings').addEventListener('click', () => {
      let next;
      try {
        next = JSON.parse(document.getElementById('settings').value);
      } catch (err) {
        setStatus(err.message, 'error');
        return;
      }
      saveConfig(next)
        .then(startTimers)
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('reset-all').addEventListener('click', () => {
      postJson('/api/config/reset_all')
        .then((fresh) => {
          config = fresh;
          options = config.wheel_options.slice();
          showPage('settings');
          startTimers();
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    const load = async () => {
      config = await request('/api/config');
      lang = await request(`/static/lang/${config.language}.json`);
      options = config.wheel_options.slice();
      applyLang();
      startTimers();
    };

    load().catch((err) => {
      const fatal = document.getElementById('fatal');
      fatal.hidden = false;
      fatal.textContent = `${t('error_load')}: ${err.message}`;
      document.querySelectorAll('.page').forEach((section) => section.remove());
    });
  </script>
</body>
</html>
"#;
