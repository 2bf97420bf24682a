//! Message copy and keyboards for the lead capture conversation.

use crate::channels::{Button, Keyboard};

// Callback payloads.
pub const CB_PROCEED: &str = "PROCEED";
pub const CB_CANCEL: &str = "CANCEL";
pub const CB_RESTART: &str = "RESTART";
pub const CB_PLATFORM_PREFIX: &str = "PLATFORM::";
pub const CB_REGION_PREFIX: &str = "REGION::";
pub const CB_EDIT_DETAILS: &str = "EDIT_DETAILS";
pub const CB_DETAILS_OK: &str = "DETAILS_OK";

pub const WELCOME: &str = "📊Welcome to E2T Copy Trading.📊\n\n\
We'll get you set up in a few steps.\n\n\
In a few seconds, you will receive our introductory message from our CEO.";

pub const PROCEED_PROMPT: &str = "Before you proceed we just require some details from you.\n\n\
If you wish to continue please click PROCEED below.";

pub const CANCELLED: &str = "Thank you for your time.\n\n\
If you wish to start again, click the button below.";

pub const ASK_PLATFORM: &str = "1️⃣ STEP 1:\n\nChoose your trading platform:";

pub const ASK_EMAIL: &str = "2️⃣ STEP 2:\n\nPlease type your email address.\n(must be valid)";

/// Email prompt when the platform step is not configured.
pub const ASK_EMAIL_FIRST: &str = "1️⃣ STEP 1:\n\nPlease type your email address.\n(must be valid)";

pub const EDIT_RESTART_PLATFORM: &str =
    "No problem.\n\n1️⃣ STEP 1:\n\nChoose your trading platform again:";

pub const EDIT_RESTART_EMAIL: &str =
    "No problem.\n\n1️⃣ STEP 1:\n\nPlease type your email address again.";

pub const BAD_EMAIL: &str = "❌ That email doesn't look valid.\n\n\
Please type a valid email like:\nname@example.com";

pub const ASK_PHONE: &str = "3️⃣ STEP 3:\n\nPlease enter your mobile number with country code.\n\n\
Format (required):\n+447123456789\n+971501234567\n+919876543210";

pub const BAD_PHONE: &str = "❌ That phone number is not valid.\n\n\
It must include country code and start with +, for example:\n+447123456789";

pub const ASK_REGION: &str = "4️⃣ STEP 4: Select your region:";

pub const BAD_PLATFORM: &str = "Please choose a valid platform.";
pub const BAD_REGION: &str = "Please choose a valid region.";

pub const DETAILS_SAVED: &str = "✅ Perfect — thanks! Now please watch the setup video below.";

pub const SAVE_FAILED: &str =
    "⚠️ We couldn't save your details just now. Please tap the button again.";

pub const INTRO_VIDEO_CAPTION: &str = "Welcome video";

pub const GUIDE_PDF_CAPTION: &str =
    "📄 Here is your Copy Trading Guide PDF attached. Please read carefully.";

pub const GUIDE_MISSING: &str =
    "Guide PDF is not configured on the server. Please contact support.";

pub const SETUP_VIDEO_CAPTION: &str = "▶️ Watch this video to set up your trading account.";

pub const SETUP_LINK_TEXT: &str = "▶️ Setup video:\nTap below to watch:";

pub const SETUP_LINK_LABEL: &str = "▶️ Watch setup video";

pub const SETUP_MISSING: &str = "Setup video is not configured. Please contact support.";

pub const AFFILIATE_PROMPT: &str = "Once you understand, click the button below and follow the \
link to set up your account for our Copy Trading system.";

pub const IGNORED_TEXT: &str = "Please use the buttons above, or send /start to begin again.";

pub const GENERIC_ERROR: &str =
    "⚠️ Something went wrong on our side. Please try again, or contact support.";

pub fn help_text(help_email: &str) -> String {
    format!("Use /start to begin the onboarding process.\nNeed help? Email {help_email}")
}

pub fn proceed_cancel_keyboard() -> Keyboard {
    vec![
        vec![Button::callback("✅ PROCEED", CB_PROCEED)],
        vec![Button::callback("❌ CANCEL", CB_CANCEL)],
    ]
}

pub fn restart_keyboard() -> Keyboard {
    vec![vec![Button::callback("🔁 START AGAIN", CB_RESTART)]]
}

pub fn platform_keyboard(platforms: &[String]) -> Keyboard {
    platforms
        .iter()
        .map(|p| vec![Button::callback(p.clone(), format!("{CB_PLATFORM_PREFIX}{p}"))])
        .collect()
}

pub fn region_keyboard(regions: &[String]) -> Keyboard {
    regions
        .iter()
        .map(|r| vec![Button::callback(r.clone(), format!("{CB_REGION_PREFIX}{r}"))])
        .collect()
}

pub fn review_keyboard() -> Keyboard {
    vec![
        vec![Button::callback("✏️ I need to edit my details", CB_EDIT_DETAILS)],
        vec![Button::callback("✅ My details are correct", CB_DETAILS_OK)],
    ]
}

pub fn review_text(platform: &str, email: &str, phone: &str, region: &str, support: &str) -> String {
    format!(
        "✅ Done — Please review your details before continuing:\n\n\
         PLATFORM: {platform}\nEMAIL: {email}\nPHONE: {phone}\nREGION: {region}\n\n\
         If you have any questions, do not hesitate to message {support}"
    )
}

pub fn final_instructions(support: &str) -> String {
    format!(
        "✅ After you've opened your account, please confirm with our team.\n\n\
         Message {support} with:\n\
         • Your full name\n\
         • The email address you used to open the account\n\n\
         We'll then add you to our Premium Copy Trader."
    )
}
