// Start-URL redirect for the installed app

use pigeon_site_core::is_locale_code;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const DASHBOARD_START: &str = "/dashboard/map";

/// Session-storage key marking that the redirect already happened
pub const REDIRECTED_KEY: &str = "pwa-redirected";

#[derive(Debug, Clone, Copy)]
pub struct LaunchContext<'a> {
    pub path: &'a str,
    pub standalone: bool,
    pub already_redirected: bool,
    pub has_token: bool,
}

/// Redirect once per session, from the landing pages only, when running as
/// an installed app. Signed-in users go to the dashboard, others to login.
pub fn start_url_redirect(ctx: &LaunchContext<'_>) -> Option<&'static str> {
    if !ctx.standalone || ctx.already_redirected {
        return None;
    }
    if ctx.path.contains(LOGIN_PATH) || ctx.path.contains(REGISTER_PATH) {
        return None;
    }
    if !is_launch_path(ctx.path) {
        return None;
    }

    let target = if ctx.has_token {
        DASHBOARD_START
    } else {
        LOGIN_PATH
    };
    (ctx.path.trim_end_matches('/') != target).then_some(target)
}

/// `/`, `/<ll>` and anything below it, or `/dashboard/...`
fn is_launch_path(path: &str) -> bool {
    if path == "/" || path.starts_with("/dashboard/") {
        return true;
    }
    let first = path
        .strip_prefix('/')
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default();
    is_locale_code(first)
}
