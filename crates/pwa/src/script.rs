// `/dashboard-pwa.js`: the in-page side of the controller

use pigeon_site_core::{SiteConfig, UpdatePolicy};
use serde_json::json;

use crate::cookie::{Cookies, Environment, TOKEN};
use crate::redirect::{DASHBOARD_START, LOGIN_PATH, REDIRECTED_KEY, REGISTER_PATH};

const TEMPLATE: &str = r#"// PWA registration, update handling, install prompt
(function () {
  "use strict";

  const CONFIG = __CONFIG__;

  function isPWAInstalled() {
    return (
      (window.matchMedia &&
        window.matchMedia("(display-mode: standalone)").matches) ||
      window.navigator.standalone === true
    );
  }
  window.isPWAInstalled = isPWAInstalled;

  function hasToken() {
    return document.cookie
      .split("; ")
      .some(function (c) { return c.indexOf(CONFIG.tokenCookie + "=") === 0 && c.length > CONFIG.tokenCookie.length + 1; });
  }

  function isLaunchPath(path) {
    return path === "/" || path.indexOf("/dashboard/") === 0 || /^\/[a-z]{2}(\/.*)?$/.test(path);
  }

  (function startUrlRedirect() {
    const path = window.location.pathname;
    if (!isPWAInstalled() || sessionStorage.getItem(CONFIG.redirectedKey)) return;
    if (path.indexOf(CONFIG.loginPath) !== -1 || path.indexOf(CONFIG.registerPath) !== -1) return;
    if (!isLaunchPath(path)) return;
    const target = hasToken() ? CONFIG.dashboardStart : CONFIG.loginPath;
    if (path.replace(/\/+$/, "") === target) return;
    sessionStorage.setItem(CONFIG.redirectedKey, "true");
    window.location.href = target;
  })();

  if (!("serviceWorker" in navigator)) {
    console.debug("[PWA] Service Worker not supported");
    return;
  }

  let pendingWorker = null;
  let updateRequested = false;

  function applyUpdate() {
    if (!pendingWorker || updateRequested) return false;
    updateRequested = true;
    pendingWorker.postMessage({ type: "SKIP_WAITING" });
    setTimeout(function () { window.location.reload(); }, CONFIG.reloadDelayMs);
    return true;
  }
  window.applyPWAUpdate = applyUpdate;

  window.addEventListener("load", function () {
    navigator.serviceWorker
      .register(CONFIG.serviceWorker, { scope: CONFIG.scope })
      .then(function (registration) {
        registration.addEventListener("updatefound", function () {
          const newWorker = registration.installing;
          if (!newWorker) return;
          newWorker.addEventListener("statechange", function () {
            if (newWorker.state === "installed" && navigator.serviceWorker.controller) {
              pendingWorker = newWorker;
              if (CONFIG.updatePolicy === "eager") {
                applyUpdate();
              } else {
                window.dispatchEvent(new CustomEvent("pwa-update-ready"));
              }
            }
          });
        });
      })
      .catch(function (error) {
        console.warn("[PWA] Service Worker registration failed:", error);
      });
  });

  navigator.serviceWorker.addEventListener("message", function (event) {
    console.debug("[PWA] Message from service worker:", event.data);
  });

  let deferredPrompt = null;

  window.addEventListener("beforeinstallprompt", function (e) {
    e.preventDefault();
    deferredPrompt = e;
    if (window.showInstallButton) {
      window.showInstallButton();
    }
  });

  window.installPWA = function () {
    if (!deferredPrompt) return false;
    const prompt = deferredPrompt;
    deferredPrompt = null;
    prompt.prompt();
    return true;
  };
})();
"#;

/// Registration script for the configured worker, policy and cookies
pub fn registration_script(config: &SiteConfig) -> String {
    let pwa = &config.pwa;
    let cookies = Cookies::new(&config.cookies, Environment::Production);
    let settings = json!({
        "serviceWorker": pwa.service_worker,
        "scope": pwa.scope,
        "updatePolicy": match pwa.update_policy {
            UpdatePolicy::Eager => "eager",
            UpdatePolicy::Notify => "notify",
        },
        "reloadDelayMs": pwa.reload_delay.as_millis() as u64,
        "tokenCookie": cookies.name(TOKEN),
        "redirectedKey": REDIRECTED_KEY,
        "loginPath": LOGIN_PATH,
        "registerPath": REGISTER_PATH,
        "dashboardStart": DASHBOARD_START,
    });

    TEMPLATE.replace("__CONFIG__", &settings.to_string().replace("</", "<\\/"))
}
