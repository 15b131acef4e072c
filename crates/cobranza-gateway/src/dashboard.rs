//! Embedded monitoring dashboard.

/// Static dashboard HTML, served at `/dashboard`.
pub fn dashboard_html() -> &'static str {
    DASHBOARD_HTML
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Cobranza — Panel</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0; background: #f4f6f8; color: #1d2733; }
  header { background: #128c7e; color: #fff; padding: 16px 24px; }
  header h1 { margin: 0; font-size: 20px; }
  main { max-width: 960px; margin: 24px auto; padding: 0 16px; }
  .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 16px; }
  .card { background: #fff; border-radius: 8px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
  .card .label { font-size: 12px; color: #6b7885; text-transform: uppercase; }
  .card .value { font-size: 26px; font-weight: 600; margin-top: 4px; }
  .ok { color: #128c7e; } .bad { color: #c0392b; }
  table { width: 100%; border-collapse: collapse; background: #fff; border-radius: 8px; margin-top: 24px; }
  th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid #e4e8ec; font-size: 13px; }
  th { background: #eef1f4; }
  .actions { margin-top: 16px; }
  button { background: #128c7e; color: #fff; border: 0; border-radius: 6px; padding: 8px 14px; cursor: pointer; margin-right: 8px; }
  button.danger { background: #c0392b; }
  #pairing { margin-top: 16px; font-size: 22px; letter-spacing: 3px; font-weight: 600; }
</style>
</head>
<body>
<header><h1>Cobranza — Recordatorios de pago</h1></header>
<main>
  <div class="cards">
    <div class="card"><div class="label">Conexión</div><div class="value" id="conexion">…</div></div>
    <div class="card"><div class="label">Enviados este mes</div><div class="value" id="mes">…</div></div>
    <div class="card"><div class="label">Enviados hoy</div><div class="value" id="hoy">…</div></div>
    <div class="card"><div class="label">Restantes</div><div class="value" id="restantes">…</div></div>
  </div>
  <div id="pairing"></div>
  <div class="actions">
    <button onclick="refresh()">Actualizar</button>
    <button onclick="window.location='/notifications/export?format=csv'">Exportar CSV</button>
    <button class="danger" onclick="clearHistory()">Limpiar historial</button>
  </div>
  <table>
    <thead><tr><th>Fecha</th><th>Cliente</th><th>Teléfono</th><th>Tipo</th><th>Saldo</th><th>Resultado</th><th>Método</th></tr></thead>
    <tbody id="historial"></tbody>
  </table>
</main>
<script>
async function refresh() {
  const st = await fetch('/status').then(r => r.json());
  const conexion = document.getElementById('conexion');
  conexion.textContent = st.connected ? 'Conectado' : 'Desconectado';
  conexion.className = 'value ' + (st.connected ? 'ok' : 'bad');
  document.getElementById('mes').textContent = st.stats.totalSent;
  document.getElementById('hoy').textContent = st.stats.todaySent;
  document.getElementById('restantes').textContent = st.remaining;

  const pairing = document.getElementById('pairing');
  if (st.qrAvailable) {
    const qr = await fetch('/qrcode').then(r => r.json());
    pairing.textContent = qr.available ? 'Código de vinculación: ' + qr.qr : '';
  } else {
    pairing.textContent = '';
  }

  const hist = await fetch('/notifications/history?limit=20').then(r => r.json());
  const rows = hist.notificaciones.map(n => `<tr>
    <td>${new Date(n.timestamp).toLocaleString('es-MX')}</td>
    <td>${n.cliente}</td>
    <td>${n.telefono}</td>
    <td>${n.tipo}</td>
    <td>$${Math.abs(n.saldo).toFixed(2)}</td>
    <td class="${n.exito ? 'ok' : 'bad'}">${n.exito ? 'Enviado' : (n.error || 'Falló')}</td>
    <td>${n.metodo}</td>
  </tr>`).join('');
  document.getElementById('historial').innerHTML = rows || '<tr><td colspan="7">Sin notificaciones</td></tr>';
}
async function clearHistory() {
  if (!confirm('¿Eliminar todo el historial?')) return;
  await fetch('/notifications/clear', { method: 'DELETE' });
  refresh();
}
refresh();
setInterval(refresh, 10000);
</script>
</body>
</html>
"#;
