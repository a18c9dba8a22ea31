pub const REPORT_CSS: &str = include_str!("report.css");

/// Browser-side counterpart of [`crate::toggle::ToggleController`].
pub const REPORT_JS: &str = r#"document.addEventListener("DOMContentLoaded", function () {
  document.querySelectorAll(".test-details").forEach(function (details) {
    details.classList.add("hidden");
  });

  document.querySelectorAll(".test-header").forEach(function (header) {
    header.addEventListener("click", function () {
      var details = header.nextElementSibling;
      var chevron = header.querySelector(".fa-chevron-right");
      if (!details) return;
      details.classList.toggle("hidden");
      if (chevron) {
        chevron.style.transform = details.classList.contains("hidden")
          ? "rotate(0deg)"
          : "rotate(90deg)";
      }
    });
  });
});
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_resolves_panel_inside_click_handler() {
        let listener = REPORT_JS.find(r#"addEventListener("click""#).unwrap();
        let lookup = REPORT_JS.find("header.nextElementSibling").unwrap();
        let chevron = REPORT_JS.find(r#"header.querySelector(".fa-chevron-right")"#).unwrap();
        assert!(listener < lookup && listener < chevron);
    }
}
