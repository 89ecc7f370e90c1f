use std::time::Duration;

use form_saver::dom::document::{Document, Element, NodeId, SelectOption};

pub const PAGE_URL: &str = "https://example.com/signup?step=2";

/// A signup page with one field of every captured kind, plus a password
/// field that must never be captured.
pub struct SignupForm {
    pub doc: Document,
    pub form: NodeId,
    pub email: NodeId,
    pub bio: NodeId,
    pub newsletter: NodeId,
    pub basic: NodeId,
    pub pro: NodeId,
    pub country: NodeId,
    pub nickname: NodeId,
    pub password: NodeId,
}

pub fn country_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("", "Choose a country"),
        SelectOption::new("de", "Germany"),
        SelectOption::new("fr", "France"),
    ]
}

/// `<body><form>` email#email, textarea[name=bio], checkbox#newsletter,
/// radio plan=basic, radio plan=pro, select#country, `<div>` with an
/// anonymous text input, password#pw.
pub fn signup_form() -> SignupForm {
    let mut doc = Document::new();
    let body = doc.body();
    let form = doc.append(body, Element::new("form")).unwrap();
    let email = doc.append(form, Element::input("email").with_id("email")).unwrap();
    let bio = doc.append(form, Element::new("textarea").with_name("bio")).unwrap();
    let newsletter = doc
        .append(form, Element::input("checkbox").with_id("newsletter"))
        .unwrap();
    let basic = doc
        .append(form, Element::input("radio").with_name("plan").with_value("basic"))
        .unwrap();
    let pro = doc
        .append(form, Element::input("radio").with_name("plan").with_value("pro"))
        .unwrap();
    let country = doc
        .append(form, Element::select(country_options()).with_id("country"))
        .unwrap();
    let wrapper = doc.append(form, Element::new("div")).unwrap();
    let nickname = doc.append(wrapper, Element::input("text")).unwrap();
    let password = doc.append(form, Element::input("password").with_id("pw")).unwrap();

    SignupForm {
        doc,
        form,
        email,
        bio,
        newsletter,
        basic,
        pro,
        country,
        nickname,
        password,
    }
}

/// The signup form with every field filled in.
pub fn filled_signup_form() -> SignupForm {
    let mut page = signup_form();
    let doc = &mut page.doc;
    doc.set_value(page.email, "ada@example.com").unwrap();
    doc.set_value(page.bio, "Writes programs").unwrap();
    doc.set_checked(page.newsletter, true).unwrap();
    doc.set_checked(page.pro, true).unwrap();
    doc.set_value(page.country, "fr").unwrap();
    doc.set_value(page.nickname, "ada").unwrap();
    doc.set_value(page.password, "hunter2").unwrap();
    page
}

/// Body with two unnamed text inputs.
pub fn two_text_inputs() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    let first = doc.append(body, Element::input("text")).unwrap();
    let second = doc.append(body, Element::input("text")).unwrap();
    (doc, first, second)
}

/// Let spawned tasks run without advancing the (paused) clock.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
