pub fn render_index(ai_available: bool) -> String {
    let badge = if ai_available {
        "AI coaching on"
    } else {
        "Template coaching"
    };
    INDEX_HTML.replace("{{AI_BADGE}}", badge)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Athlete Training Log</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg: #eef3f1;
      --ink: #1f2a2e;
      --muted: #6a7477;
      --accent: #1f8a70;
      --accent-2: #ff7f50;
      --card: rgba(255, 255, 255, 0.9);
      --line: rgba(31, 42, 46, 0.1);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(160deg, #dff1ea, var(--bg) 45%, #fdf1e8);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(980px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 26px;
      box-shadow: 0 24px 60px rgba(31, 42, 46, 0.15);
      padding: 32px;
      display: grid;
      gap: 26px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(1.9rem, 4vw, 2.6rem);
      margin: 0;
    }

    h2 { margin: 0 0 12px; font-size: 1.2rem; }

    .badge {
      border-radius: 999px;
      padding: 6px 14px;
      background: rgba(31, 138, 112, 0.12);
      color: var(--accent);
      font-weight: 600;
      font-size: 0.85rem;
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
      gap: 14px;
    }

    .card {
      background: white;
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 16px;
    }

    .card .label {
      display: block;
      font-size: 0.75rem;
      letter-spacing: 0.12em;
      text-transform: uppercase;
      color: var(--muted);
    }

    .card .value {
      display: block;
      margin-top: 6px;
      font-size: 1.5rem;
      font-weight: 600;
    }

    form {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 10px;
      align-items: end;
    }

    input, select {
      width: 100%;
      padding: 10px 12px;
      border-radius: 10px;
      border: 1px solid var(--line);
      font: inherit;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 11px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    button.secondary { background: var(--ink); }

    .tabs { display: flex; gap: 6px; }

    .tab {
      background: rgba(31, 42, 46, 0.08);
      color: var(--muted);
    }

    .tab.active { background: var(--accent-2); color: white; }

    .charts {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
      gap: 16px;
    }

    svg { width: 100%; height: 200px; display: block; }
    .bar { fill: var(--accent); }
    .trend { fill: none; stroke: var(--accent-2); stroke-width: 3; }
    .axis-label { fill: var(--muted); font-size: 11px; }

    ul.types { list-style: none; margin: 0; padding: 0; display: grid; gap: 8px; }
    ul.types li { display: flex; justify-content: space-between; }

    .status { min-height: 1.2em; color: var(--muted); }
    .status[data-type="error"] { color: #c0392b; }
    .hidden { display: none; }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Athlete Training Log</h1>
      <span class="badge">{{AI_BADGE}}</span>
    </header>

    <section id="auth">
      <h2>Sign in</h2>
      <form id="login-form">
        <input name="email" type="email" placeholder="Email" required />
        <input name="password" type="password" placeholder="Password" required />
        <button type="submit">Sign in</button>
        <button type="button" class="secondary" id="register-btn">Register</button>
      </form>
    </section>

    <section id="dashboard" class="hidden">
      <div class="tabs" role="tablist">
        <button class="tab" type="button" data-period="7d">7 days</button>
        <button class="tab active" type="button" data-period="30d">30 days</button>
        <button class="tab" type="button" data-period="90d">90 days</button>
      </div>

      <div class="cards" id="overview"></div>

      <div class="charts">
        <div class="card">
          <h2>This week</h2>
          <svg id="weekly" viewBox="0 0 420 200" role="img" aria-label="Workouts per weekday"></svg>
        </div>
        <div class="card">
          <h2>Recent progress</h2>
          <svg id="trend" viewBox="0 0 420 200" role="img" aria-label="Duration of recent workouts"></svg>
        </div>
        <div class="card">
          <h2>By type</h2>
          <ul class="types" id="types"></ul>
        </div>
      </div>

      <h2>Log a workout</h2>
      <form id="workout-form">
        <select name="category">
          <option>run</option><option>lift</option><option>cycle</option>
          <option>swim</option><option>crossfit</option><option>yoga</option><option>other</option>
        </select>
        <input name="durationMinutes" type="number" min="0" step="1" placeholder="Minutes" required />
        <input name="distanceKm" type="number" min="0" step="0.01" placeholder="Distance (km)" />
        <input name="avgHeartRate" type="number" min="1" placeholder="Avg HR" />
        <input name="perceivedEffort" type="number" min="1" max="10" placeholder="Effort 1-10" />
        <button type="submit">Save</button>
      </form>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const DAYS = ['Sun', 'Mon', 'Tue', 'Wed', 'Thu', 'Fri', 'Sat'];
    const statusEl = document.getElementById('status');
    let token = localStorage.getItem('token');
    let period = '30d';

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const api = async (path, options = {}) => {
      const headers = { 'content-type': 'application/json' };
      if (token) headers.authorization = `Bearer ${token}`;
      const res = await fetch(path, { ...options, headers });
      const body = await res.json().catch(() => ({}));
      if (!res.ok) throw new Error(body.error || `Request failed (${res.status})`);
      return body;
    };

    const fmt = (value, decimals = 0) =>
      typeof value === 'number' ? value.toFixed(decimals) : '--';

    const renderOverview = (o) => {
      const cards = [
        ['Workouts', fmt(o.totalWorkouts)],
        ['Minutes', fmt(o.totalDuration)],
        ['Distance km', fmt(o.totalDistance, 1)],
        ['Calories', fmt(o.totalCalories)],
        ['Avg HR', fmt(o.avgHeartRate)],
        ['Avg pace', fmt(o.avgPace, 2)],
      ];
      document.getElementById('overview').innerHTML = cards
        .map(([label, value]) => `<div class="card"><span class="label">${label}</span><span class="value">${value}</span></div>`)
        .join('');
    };

    const renderWeekly = (buckets) => {
      const svg = document.getElementById('weekly');
      if (!buckets.length) {
        svg.innerHTML = '<text class="axis-label" x="50%" y="50%" text-anchor="middle">No workouts yet</text>';
        return;
      }
      const max = Math.max(1, ...buckets.map((b) => b.count));
      const width = 420 / 7;
      svg.innerHTML = buckets.map((b, i) => {
        const h = (b.count / max) * 150;
        return `<rect class="bar" x="${i * width + 8}" y="${170 - h}" width="${width - 16}" height="${h}" rx="6" />` +
          `<text class="axis-label" x="${i * width + width / 2}" y="190" text-anchor="middle">${DAYS[b.dayOrdinal - 1]}</text>`;
      }).join('');
    };

    const renderTrend = (points) => {
      const svg = document.getElementById('trend');
      if (!points.length) {
        svg.innerHTML = '<text class="axis-label" x="50%" y="50%" text-anchor="middle">No workouts yet</text>';
        return;
      }
      const max = Math.max(1, ...points.map((p) => p.duration));
      const step = points.length > 1 ? 380 / (points.length - 1) : 0;
      const path = points
        .map((p, i) => `${i === 0 ? 'M' : 'L'} ${20 + i * step} ${170 - (p.duration / max) * 150}`)
        .join(' ');
      svg.innerHTML = `<path class="trend" d="${path}" />` + points
        .map((p, i) => `<text class="axis-label" x="${20 + i * step}" y="190" text-anchor="middle">${p.sequenceIndex}</text>`)
        .join('');
    };

    const renderTypes = (types) => {
      document.getElementById('types').innerHTML = types.length
        ? types.map((t) => `<li><span>${t.category}</span><span>${t.count} &middot; ${fmt(t.totalDuration)} min</span></li>`).join('')
        : '<li>No workouts yet</li>';
    };

    const loadStats = async () => {
      const stats = await api(`/api/workouts/stats/overview?period=${period}`);
      renderOverview(stats.overview);
      renderWeekly(stats.weeklyActivity);
      renderTrend(stats.recentProgress);
      renderTypes(stats.byType);
    };

    const showDashboard = () => {
      document.getElementById('auth').classList.add('hidden');
      document.getElementById('dashboard').classList.remove('hidden');
      loadStats().catch((err) => setStatus(err.message, 'error'));
    };

    const authenticate = async (path) => {
      const form = new FormData(document.getElementById('login-form'));
      const payload = { email: form.get('email'), password: form.get('password') };
      if (path.endsWith('register')) payload.name = payload.email.split('@')[0];
      const body = await api(path, { method: 'POST', body: JSON.stringify(payload) });
      token = body.token;
      localStorage.setItem('token', token);
      showDashboard();
    };

    document.getElementById('login-form').addEventListener('submit', (event) => {
      event.preventDefault();
      authenticate('/api/auth/login').catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('register-btn').addEventListener('click', () => {
      authenticate('/api/auth/register').catch((err) => setStatus(err.message, 'error'));
    });

    document.querySelectorAll('.tab').forEach((button) => {
      button.addEventListener('click', () => {
        period = button.dataset.period;
        document.querySelectorAll('.tab').forEach((b) => b.classList.toggle('active', b === button));
        loadStats().catch((err) => setStatus(err.message, 'error'));
      });
    });

    document.getElementById('workout-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const payload = { category: form.get('category') };
      for (const key of ['durationMinutes', 'distanceKm', 'avgHeartRate', 'perceivedEffort']) {
        const raw = form.get(key);
        if (raw !== '') payload[key] = Number(raw);
      }
      api('/api/workouts', { method: 'POST', body: JSON.stringify(payload) })
        .then(() => {
          event.target.reset();
          setStatus('Saved', 'ok');
          return loadStats();
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    if (token) {
      api('/api/auth/me')
        .then(showDashboard)
        .catch(() => {
          token = null;
          localStorage.removeItem('token');
        });
    }
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_reflects_generator_availability() {
        assert!(render_index(true).contains("AI coaching on"));
        let page = render_index(false);
        assert!(page.contains("Template coaching"));
        assert!(!page.contains("{{AI_BADGE}}"));
    }
}
