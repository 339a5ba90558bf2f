//! Static dashboard page.
//!
//! The shell renders a card grid that the embedded script fills by polling
//! `/api/current` every two seconds; the server does no templating beyond
//! splicing the device IP into the subtitle between the two halves below.

/// Everything up to the device IP in the subtitle.
pub const DASHBOARD_HEAD: &str = "\
<!DOCTYPE html>
<html>
<head>
<title>Battery Monitor Dashboard</title>
<meta name='viewport' content='width=device-width, initial-scale=1'>
<style>
body { font-family: Arial, sans-serif; margin: 20px; background: #f0f0f0; }
.container { max-width: 1200px; margin: 0 auto; background: white; padding: 20px; border-radius: 10px; }
.battery-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 15px; margin: 20px 0; }
.battery-card { border: 2px solid #ddd; border-radius: 8px; padding: 15px; text-align: center; }
.healthy { border-color: #4CAF50; background: #f8fff8; }
.warning { border-color: #ff9800; background: #fff8f0; }
.critical { border-color: #f44336; background: #fff0f0; }
.voltage { font-size: 24px; font-weight: bold; margin: 10px 0; }
.percentage { font-size: 18px; color: #666; }
h1 { text-align: center; color: #333; }
</style>
</head>
<body>
<div class='container'>
<h1>Battery Monitor Dashboard</h1>
<p style='text-align: center; color: #666;'>Device IP: ";

/// Everything after the device IP: grid container and polling script.
pub const DASHBOARD_TAIL: &str = "\
</p>
<p id='datetime' style='text-align: center; color: #888; font-size: 14px;'></p>
<div class='battery-grid' id='batteryGrid'>
</div>
</div>
<script>
function updateDashboard() {
  fetch('/api/current')
    .then(response => response.json())
    .then(data => {
      const grid = document.getElementById('batteryGrid');
      grid.innerHTML = '';
      data.batteries.forEach((battery, index) => {
        const card = document.createElement('div');
        card.className = 'battery-card ' + (battery.percentage > 50 ? 'healthy' : battery.percentage > 20 ? 'warning' : 'critical');
        card.innerHTML = `
          <h3>Battery ${index + 1}</h3>
          <div class='voltage'>${battery.voltage.toFixed(2)}V</div>
          <div class='percentage'>${battery.percentage.toFixed(1)}%</div>
          <div>Raw: ${battery.raw}</div>
        `;
        grid.appendChild(card);
      });
      if (data.datetime) {
        document.getElementById('datetime').textContent = 'Last updated: ' + data.datetime;
      }
    });
}
updateDashboard();
setInterval(updateDashboard, 2000);
</script>
</body>
</html>
";

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_polls_current_endpoint() {
        assert!(DASHBOARD_TAIL.contains("fetch('/api/current')"));
        assert!(DASHBOARD_TAIL.contains("setInterval(updateDashboard, 2000);"));
    }

    #[test]
    fn test_shell_halves_splice_around_ip() {
        assert!(DASHBOARD_HEAD.ends_with("Device IP: "));
        assert!(DASHBOARD_TAIL.starts_with("</p>"));
        assert!(DASHBOARD_HEAD.starts_with("<!DOCTYPE html>"));
        assert!(DASHBOARD_TAIL.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_shell_health_classes_match_thresholds() {
        // Card styling mirrors the 20% health threshold used by the firmware
        assert!(DASHBOARD_TAIL.contains("battery.percentage > 20"));
        assert!(DASHBOARD_HEAD.contains(".critical"));
        assert!(DASHBOARD_HEAD.contains(".healthy"));
    }
}
