//! Embedded dashboard page.
//!
//! A single static document: date pickers, the "Update Data" button, an
//! error banner and a six-panel grid. Figures arrive as Plotly JSON from the
//! session endpoints and are drawn with `Plotly.react`. Updates committed by
//! the auto-refresh timer arrive over SSE.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Fuel Margin Dashboard</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  body { background: black; color: white; font-family: sans-serif; margin: 0; padding: 16px; }
  header { display: flex; gap: 12px; align-items: center; flex-wrap: wrap; margin-bottom: 12px; }
  h1 { font-size: 20px; margin: 0 24px 0 0; }
  input, button { background: #111; color: white; border: 1px solid #333; padding: 6px 10px; }
  button { cursor: pointer; }
  #validation { color: #ff8080; font-size: 13px; }
  #banner { display: none; background: #5a1010; border: 1px solid #a33; padding: 10px; margin-bottom: 12px; }
  #grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 12px; }
  .panel { height: 350px; }
  #status { color: #888; font-size: 12px; margin-left: auto; }
</style>
</head>
<body>
<header>
  <h1>Fuel Margin Dashboard</h1>
  <label>Start <input type="date" id="start"></label>
  <label>End <input type="date" id="end"></label>
  <button id="update">Update Data</button>
  <span id="validation"></span>
  <span id="status"></span>
</header>
<div id="banner"></div>
<div id="grid"></div>
<script>
(function () {
  const startInput = document.getElementById("start");
  const endInput = document.getElementById("end");
  const banner = document.getElementById("banner");
  const grid = document.getElementById("grid");
  const validation = document.getElementById("validation");
  const status = document.getElementById("status");
  let sessionId = null;
  let latestGeneration = -1;
  let currentRange = null;
  let events = null;

  function syncUrl(range) {
    const url = new URL(window.location);
    url.searchParams.set("start", range.start);
    url.searchParams.set("end", range.end);
    window.history.replaceState(null, "", url);
  }

  function render(snapshot) {
    if (snapshot.generation < latestGeneration) return;
    latestGeneration = snapshot.generation;
    currentRange = snapshot.range;
    startInput.value = snapshot.range.start;
    endInput.value = snapshot.range.end;
    syncUrl(snapshot.range);

    const view = snapshot.view;
    if (!view) return;
    status.textContent = "Updated " + new Date(view.rendered_at).toLocaleTimeString();
    if (view.status === "failed") {
      banner.textContent = "Error loading data: " + view.error.message;
      banner.style.display = "block";
      grid.innerHTML = "";
      return;
    }
    banner.style.display = "none";
    view.panels.forEach(function (panel, i) {
      let div = document.getElementById("panel-" + i);
      if (!div) {
        div = document.createElement("div");
        div.id = "panel-" + i;
        div.className = "panel";
        grid.appendChild(div);
      }
      Plotly.react(div, panel.figure.data, panel.figure.layout, panel.config);
    });
  }

  async function call(method, path, body) {
    const opts = { method: method, headers: {} };
    if (body !== undefined) {
      opts.headers["Content-Type"] = "application/json";
      opts.body = JSON.stringify(body);
    }
    const resp = await fetch(path, opts);
    const json = await resp.json();
    if (resp.status === 404 && sessionId) {
      // Session expired on the server; start a new one on the same dates.
      await open({ start: startInput.value, end: endInput.value });
      return null;
    }
    if (resp.status === 400) {
      validation.textContent = json.message;
      return null;
    }
    if (!resp.ok && !json.session_id) {
      banner.textContent = "Error: " + (json.message || resp.statusText);
      banner.style.display = "block";
      return null;
    }
    validation.textContent = "";
    return json;
  }

  function listen() {
    if (events) events.close();
    const id = sessionId;
    events = new EventSource("/v1/sessions/" + id + "/events");
    events.addEventListener("dashboard", function (e) {
      render(JSON.parse(e.data));
    });
    events.onerror = function () {
      if (events.readyState === EventSource.CLOSED && id === sessionId) {
        open({ start: startInput.value, end: endInput.value });
      }
    };
  }

  async function loadConfig() {
    const config = await (await fetch("/v1/config")).json();
    if (config.bounds) {
      startInput.min = endInput.min = config.bounds.earliest;
      startInput.max = endInput.max = config.bounds.latest;
    }
  }

  async function open(range) {
    const query = new URLSearchParams();
    if (range.start) query.set("start", range.start);
    if (range.end) query.set("end", range.end);

    sessionId = null;
    latestGeneration = -1;
    const snapshot = await call("POST", "/v1/sessions?" + query.toString());
    if (!snapshot) return;
    sessionId = snapshot.session_id;
    render(snapshot);
    listen();
  }

  document.getElementById("update").addEventListener("click", async function () {
    if (!sessionId) return open({ start: startInput.value, end: endInput.value });
    const range = { start: startInput.value, end: endInput.value };
    let snapshot;
    if (currentRange && range.start === currentRange.start && range.end === currentRange.end) {
      snapshot = await call("POST", "/v1/sessions/" + sessionId + "/refresh");
    } else {
      snapshot = await call("PUT", "/v1/sessions/" + sessionId + "/range", range);
    }
    if (snapshot) render(snapshot);
  });

  const params = new URLSearchParams(window.location.search);
  loadConfig().then(function () {
    return open({ start: params.get("start"), end: params.get("end") });
  });
})();
</script>
</body>
</html>
"##;
