use crate::models::DashboardView;

/// Server-rendered shell; the script fills it from `/api/dashboard` and `/api/records`.
pub fn render_index(view: &DashboardView) -> String {
    let (status, kind) = match view {
        DashboardView::Loading => ("Veriler yükleniyor...".to_string(), "loading"),
        DashboardView::Error { message } => (escape_html(message), "error"),
        DashboardView::Ready(payload) => {
            (format!("{} kayıt yüklendi", payload.record_count), "ok")
        }
    };
    INDEX_HTML
        .replace("{{STATUS}}", &status)
        .replace("{{STATUS_TYPE}}", kind)
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="tr">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Varakalar Dashboard</title>
  <style>
    :root {
      --bg: #f5f5f5;
      --ink: #171717;
      --muted: #525252;
      --accent: #0066ff;
      --warn: #f59e0b;
      --error: #ef4444;
      --ok: #10b981;
      --card: #ffffff;
      --line: #e5e5e5;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }
    header, main { width: min(1200px, 100%); margin: 0 auto; padding: 24px; }
    header { display: flex; justify-content: space-between; align-items: center; gap: 16px; flex-wrap: wrap; }
    h1 { margin: 0; font-size: 1.8rem; }
    h2 { margin: 0 0 12px; font-size: 1.2rem; }
    .status { color: var(--muted); min-height: 1.2em; }
    .status[data-type="error"] { color: var(--error); }
    .status[data-type="ok"] { color: var(--ok); }
    .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 16px; margin-bottom: 24px; }
    .card { background: var(--card); border: 1px solid var(--line); border-radius: 12px; padding: 20px; }
    .card .label { color: var(--muted); font-size: 0.9rem; }
    .card .value { font-size: 1.6rem; font-weight: 700; margin-top: 6px; }
    section { margin-bottom: 32px; }
    table { width: 100%; border-collapse: collapse; background: var(--card); }
    th, td { text-align: left; padding: 10px 12px; border-bottom: 1px solid var(--line); font-size: 0.92rem; }
    th[data-sort] { cursor: pointer; user-select: none; }
    .badge { padding: 2px 10px; border-radius: 999px; font-size: 0.85rem; }
    .badge.para { background: rgba(16, 185, 129, 0.12); color: var(--ok); }
    .badge.men { background: rgba(245, 158, 11, 0.14); color: var(--warn); }
    .filters { display: flex; flex-wrap: wrap; gap: 10px; margin-bottom: 12px; align-items: center; }
    input, select, button { font: inherit; padding: 8px 10px; border-radius: 8px; border: 1px solid var(--line); }
    button { background: var(--accent); color: white; border: none; cursor: pointer; }
    svg { width: 100%; height: 260px; display: block; background: var(--card); border-radius: 12px; border: 1px solid var(--line); }
    .bar { fill: var(--accent); }
    .trend { fill: none; stroke: var(--error); stroke-width: 2.5; }
    .rule { stroke: var(--warn); stroke-dasharray: 6 6; }
    .axis-label { fill: var(--muted); font-size: 10px; }
  </style>
</head>
<body>
  <header>
    <div>
      <h1>Varakalar Dashboard</h1>
      <div class="status" id="status" data-type="{{STATUS_TYPE}}">{{STATUS}}</div>
      <div class="status" id="span"></div>
    </div>
    <form id="upload-form">
      <input type="file" id="upload-file" accept=".csv,text/csv" />
      <label><input type="checkbox" id="upload-replace" /> Tabloyu değiştir</label>
      <button type="submit">Yükle</button>
    </form>
  </header>
  <main>
    <section class="grid" id="cards"></section>
    <section>
      <h2>Pareto Analizi - Kabahat Türleri</h2>
      <svg id="pareto" viewBox="0 0 800 260" role="img" aria-label="Pareto"></svg>
      <p class="status" id="vital-few"></p>
    </section>
    <section>
      <h2>En Yüksek Cezalı 3 Plaka</h2>
      <div class="grid" id="plates"></div>
    </section>
    <section>
      <h2>Yıl-Ay Kabahat Sayıları ve Trend</h2>
      <svg id="monthly" viewBox="0 0 800 260" role="img" aria-label="Aylık trend"></svg>
    </section>
    <section>
      <h2>Varaka Detay Listesi</h2>
      <div class="filters">
        <input id="f-search" placeholder="Plaka, isim veya kabahat" />
        <select id="f-category"><option value="">Tüm kabahatler</option></select>
        <select id="f-kind">
          <option value="">Tüm cezalar</option>
          <option value="para">Para cezası</option>
          <option value="men">Men cezası</option>
        </select>
        <input type="date" id="f-start" />
        <input type="date" id="f-end" />
        <label><input type="checkbox" id="f-suspension" /> Men cezaları</label>
        <a id="export-csv" href="/api/export/csv">CSV</a>
        <a id="export-report" href="/api/export/report">Rapor</a>
      </div>
      <div class="grid" id="table-cards"></div>
      <table>
        <thead>
          <tr>
            <th data-sort="sequence">Sıra No</th>
            <th data-sort="date">Tarih</th>
            <th data-sort="plate">Plaka No</th>
            <th data-sort="name">İsim</th>
            <th data-sort="category">Kabahat Türü</th>
            <th data-sort="amount">Ceza</th>
          </tr>
        </thead>
        <tbody id="rows"></tbody>
      </table>
      <p class="status" id="row-count"></p>
    </section>
  </main>
  <script>
    const statusEl = document.getElementById('status');
    const money = new Intl.NumberFormat('tr-TR', { style: 'currency', currency: 'TRY', maximumFractionDigits: 0 });
    const esc = (value) => String(value ?? '').replace(/[&<>"]/g, (c) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;' }[c]));
    const short = (value, width) => (value.length > width ? value.slice(0, width) + '...' : value);
    let sort = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const card = (label, value) => `<div class="card"><div class="label">${esc(label)}</div><div class="value">${esc(value)}</div></div>`;

    const renderBars = (svg, labels, values, line, lineMax) => {
      if (!values.length) {
        svg.innerHTML = '<text class="axis-label" x="50%" y="50%" text-anchor="middle">Veri yok</text>';
        return;
      }
      const width = 800, height = 260, pad = 40, top = 16;
      const max = Math.max(...values, 1);
      const step = (width - pad * 2) / values.length;
      const y = (value, scale) => height - pad - (value / scale) * (height - pad - top);
      let out = '';
      values.forEach((value, i) => {
        const x = pad + i * step + step * 0.15;
        out += `<rect class="bar" x="${x}" y="${y(value, max)}" width="${step * 0.7}" height="${height - pad - y(value, max)}" rx="4" />`;
        out += `<text class="axis-label" x="${x + step * 0.35}" y="${height - pad + 14}" text-anchor="middle">${esc(short(labels[i], 14))}</text>`;
      });
      if (line) {
        const scale = lineMax || Math.max(...line, 1);
        const path = line.map((v, i) => `${i === 0 ? 'M' : 'L'} ${pad + i * step + step / 2} ${y(v, scale)}`).join(' ');
        out += `<path class="trend" d="${path}" />`;
        if (lineMax) {
          out += `<line class="rule" x1="${pad}" x2="${width - pad}" y1="${y(80, lineMax)}" y2="${y(80, lineMax)}" />`;
        }
      }
      svg.innerHTML = out;
    };

    const renderDashboard = (view) => {
      if (view.status === 'loading') {
        setStatus('Veriler yükleniyor...', 'loading');
        return false;
      }
      if (view.status === 'error') {
        setStatus(view.message, 'error');
        return false;
      }
      setStatus(`${view.record_count} kayıt yüklendi${view.loading ? ' (yenileniyor...)' : ''}`, 'ok');
      const span = view.date_span;
      document.getElementById('span').textContent = span ? `Tarih aralığı: ${span.start} - ${span.end}` : 'Tarih bilgisi bulunamadı';
      const common = view.categories.most_common;
      document.getElementById('cards').innerHTML = [
        card('Toplam Ceza Sayısı', view.summary.count.toLocaleString('tr-TR')),
        card('Toplam Ceza Tutarı', money.format(view.summary.total)),
        card('Ortalama Ceza Tutarı', money.format(view.summary.average)),
        card('Farklı Kabahat Türü', view.categories.distinct),
        card('Ortalama Kabahat Sayısı', view.categories.average_per_category),
        card('En Yaygın Kabahat', common ? `${common.category} (${common.count})` : '-'),
      ].join('');
      renderBars(
        document.getElementById('pareto'),
        view.pareto.map((e) => e.category),
        view.pareto.map((e) => e.count),
        view.pareto.map((e) => e.cumulative_percentage),
        100
      );
      document.getElementById('vital-few').textContent =
        `İlk ${view.vital_few} kabahat türü kayıtların %80'ini oluşturuyor.`;
      document.getElementById('plates').innerHTML = view.top_plates
        .map((p, i) => card(`${i + 1}. ${p.plate}`, `${money.format(p.total)} · ${p.count} ceza · ort. ${money.format(p.average)}`))
        .join('');
      renderBars(
        document.getElementById('monthly'),
        view.monthly.map((m) => m.month),
        view.monthly.map((m) => m.count),
        view.monthly.map((m) => m.count)
      );
      return true;
    };

    const tableParams = () => {
      const params = new URLSearchParams();
      const set = (key, id) => {
        const value = document.getElementById(id).value;
        if (value) params.set(key, value);
      };
      set('search', 'f-search');
      set('category', 'f-category');
      set('kind', 'f-kind');
      set('start', 'f-start');
      set('end', 'f-end');
      if (document.getElementById('f-suspension').checked) params.set('suspension', 'true');
      if (sort) {
        params.set('sort', sort.field);
        params.set('dir', sort.dir);
      }
      return params;
    };

    const loadTable = async (toggle) => {
      const params = tableParams();
      if (typeof toggle === 'string') params.set('toggle', toggle);
      const res = await fetch(`/api/records?${params}`);
      if (!res.ok) return;
      const data = await res.json();
      sort = data.sort;
      const applied = tableParams();
      document.getElementById('export-csv').href = `/api/export/csv?${applied}`;
      document.getElementById('export-report').href = `/api/export/report?${applied}`;
      document.getElementById('table-cards').innerHTML = [
        card('Toplam Kayıt', data.breakdown.records),
        card('Para Cezası', data.breakdown.monetary),
        card('Men Cezası', data.breakdown.suspensions),
        card('Toplam Tutar', money.format(data.breakdown.monetary_total)),
      ].join('');
      document.getElementById('rows').innerHTML = data.records
        .map((r) => {
          const badge = `<span class="badge ${r.suspension ? 'men' : 'para'}">${esc(r.penalty)}</span>`;
          return `<tr><td>${r.sequence}</td><td>${esc(r.date)}</td><td>${esc(r.plate)}</td><td>${esc(r.name)}</td>` +
            `<td>${esc(short(r.category, 40))}<br><small>${esc(r.weekday)} • ${esc(r.season)}</small></td><td>${badge}</td></tr>`;
        })
        .join('');
      document.getElementById('row-count').textContent = `Toplam ${data.filtered_count} / ${data.total_count} kayıt gösteriliyor`;
    };

    const loadCategories = async () => {
      const res = await fetch('/api/categories');
      if (!res.ok) return;
      const select = document.getElementById('f-category');
      const categories = await res.json();
      select.innerHTML = '<option value="">Tüm kabahatler</option>' +
        categories.map((c) => `<option value="${esc(c)}">${esc(c)}</option>`).join('');
    };

    const refresh = async () => {
      try {
        const res = await fetch('/api/dashboard');
        const view = await res.json();
        if (renderDashboard(view)) {
          await loadCategories();
          await loadTable();
        }
      } catch (err) {
        setStatus(String(err), 'error');
      }
    };

    document.querySelectorAll('th[data-sort]').forEach((th) => {
      th.addEventListener('click', () => loadTable(th.dataset.sort));
    });
    ['f-search', 'f-category', 'f-kind', 'f-start', 'f-end', 'f-suspension'].forEach((id) => {
      document.getElementById(id).addEventListener('input', loadTable);
      document.getElementById(id).addEventListener('change', loadTable);
    });

    document.getElementById('upload-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const file = document.getElementById('upload-file').files[0];
      if (!file) return;
      const mode = document.getElementById('upload-replace').checked ? '?mode=replace' : '';
      const res = await fetch(`/api/upload${mode}`, { method: 'POST', body: await file.text() });
      if (!res.ok) {
        setStatus(await res.text(), 'error');
        return;
      }
      const report = await res.json();
      setStatus(`${report.imported} kayıt yüklendi, ${report.skipped} satır atlandı`, 'ok');
      await refresh();
    });

    refresh();
    setInterval(refresh, 30000);
  </script>
</body>
</html>
"#;
