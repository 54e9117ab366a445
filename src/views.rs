//! Server-rendered HTML pages
//!
//! Every handler renders through these functions. All dynamic content is
//! escaped by maud; the only raw fragment is the random-pick script, which
//! is a static string.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::store::{FeedEntry, Joke, User};

/// Picks one joke out of the hidden pool and swaps it into the visible slot.
const RANDOM_PICK_SCRIPT: &str = r#"
(function () {
  var pool = document.querySelectorAll('#joke-pool li');
  var slot = document.getElementById('random-joke');
  var again = document.getElementById('pick-again');
  function pick() {
    if (pool.length === 0) {
      slot.textContent = 'No jokes yet.';
      return;
    }
    var joke = pool[Math.floor(Math.random() * pool.length)];
    slot.textContent = joke.textContent;
  }
  again.addEventListener('click', pick);
  pick();
})();
"#;

fn layout(title: &str, current_user: Option<&User>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                link rel="stylesheet" href="/public/style.css";
            }
            body {
                header {
                    a.brand href="/" { "Jokeboard" }
                    nav {
                        a href="/" { "Home" }
                        a href="/random" { "Random" }
                        @if current_user.is_some() {
                            a href="/submit" { "Submit" }
                            a href="/edit" { "My jokes" }
                            a href="/logout" { "Log out" }
                        } @else {
                            a href="/login" { "Log in" }
                            a href="/register" { "Register" }
                        }
                    }
                }
                main {
                    (content)
                }
                footer {
                    section.signup {
                        h2 { "Get new jokes by email" }
                        form method="post" action="/signup" {
                            input type="text" name="first_name" placeholder="First name" required;
                            input type="text" name="last_name" placeholder="Last name" required;
                            input type="email" name="email" placeholder="Email address" required;
                            button type="submit" { "Sign up" }
                        }
                    }
                    p.footer-links {
                        a href="/terms" { "Terms" }
                        " | "
                        a href="/contact" { "Contact" }
                    }
                }
            }
        }
    }
}

fn joke_card(joke: &Joke, show_actions: bool) -> Markup {
    html! {
        li.joke.flagged[joke.flagged] {
            p.joke-text { (joke.text) }
            @if show_actions {
                div.joke-actions {
                    form method="post" action="/favourites" {
                        input type="hidden" name="favourite" value=(joke.id.0);
                        button.liked[joke.liked] type="submit" {
                            @if joke.liked { "Unlike" } @else { "Like" }
                        }
                    }
                    form method="post" action="/inappropriate" {
                        input type="hidden" name="inappropriate" value=(joke.id.0);
                        button type="submit" {
                            @if joke.flagged { "Unflag" } @else { "Flag" }
                        }
                    }
                }
            }
        }
    }
}

/// The aggregated feed: one section per user who has posted at least one joke.
pub fn home_page(current_user: Option<&User>, feed: &[FeedEntry]) -> Markup {
    let logged_in = current_user.is_some();
    layout(
        "Jokeboard",
        current_user,
        html! {
            h1 { "Latest jokes" }
            @if feed.is_empty() {
                p.empty {
                    "No jokes yet. "
                    a href="/submit" { "Post the first one." }
                }
            }
            @for entry in feed {
                section.user-jokes {
                    h2 { "Jokes by " (entry.user.display_name()) }
                    ul.jokes {
                        @for joke in &entry.jokes {
                            (joke_card(joke, logged_in))
                        }
                    }
                }
            }
        },
    )
}

/// Same feed data as the home page, picked from client-side so reloading
/// is not needed to get a fresh joke.
pub fn random_page(current_user: Option<&User>, feed: &[FeedEntry]) -> Markup {
    layout(
        "A random joke",
        current_user,
        html! {
            h1 { "A random joke" }
            blockquote #random-joke { }
            button #pick-again { "Show another" }
            ul #joke-pool hidden {
                @for entry in feed {
                    @for joke in &entry.jokes {
                        li { (joke.text) }
                    }
                }
            }
            script { (PreEscaped(RANDOM_PICK_SCRIPT)) }
        },
    )
}

pub fn login_page(message: Option<&str>) -> Markup {
    layout(
        "Log in",
        None,
        html! {
            h1 { "Log in" }
            @if let Some(message) = message {
                p.error { (message) }
            }
            form method="post" action="/login" {
                label { "Email"
                    input type="email" name="email" required;
                }
                label { "Password"
                    input type="password" name="password" required;
                }
                button type="submit" { "Log in" }
            }
            div.alt-login {
                a.oauth-google href="/auth/google" { "Log in with Google" }
                a.oauth-facebook href="/auth/facebook" { "Log in with Facebook" }
            }
            p { "No account yet? " a href="/register" { "Register" } }
        },
    )
}

pub fn register_page(error: Option<&str>) -> Markup {
    layout(
        "Register",
        None,
        html! {
            h1 { "Register" }
            @if let Some(error) = error {
                p.error { (error) }
            }
            form method="post" action="/register" {
                label { "Email"
                    input type="email" name="email" required;
                }
                label { "Password"
                    input type="password" name="password" required;
                }
                label { "Confirm password"
                    input type="password" name="confirm" required;
                }
                button type="submit" { "Register" }
            }
            div.alt-login {
                a.oauth-google href="/auth/google" { "Sign up with Google" }
                a.oauth-facebook href="/auth/facebook" { "Sign up with Facebook" }
            }
            p { "Already registered? " a href="/login" { "Log in" } }
        },
    )
}

pub fn submit_page(current_user: &User, error: Option<&str>) -> Markup {
    layout(
        "Submit a joke",
        Some(current_user),
        html! {
            h1 { "Submit a joke" }
            @if let Some(error) = error {
                p.error { (error) }
            }
            form method="post" action="/submit" {
                textarea name="joke" rows="4" placeholder="Make us laugh" required { }
                button type="submit" { "Submit" }
            }
        },
    )
}

/// The logged-in user's own jokes, each with edit and delete buttons.
pub fn edit_page(current_user: &User, jokes: &[Joke]) -> Markup {
    layout(
        "My jokes",
        Some(current_user),
        html! {
            h1 { "My jokes" }
            @if jokes.is_empty() {
                p.empty {
                    "You have not posted anything yet. "
                    a href="/submit" { "Submit a joke." }
                }
            }
            ul.jokes {
                @for joke in jokes {
                    li.joke {
                        p.joke-text { (joke.text) }
                        div.joke-actions {
                            form method="post" action="/update" {
                                input type="hidden" name="update" value=(joke.id.0);
                                button type="submit" { "Edit" }
                            }
                            form method="post" action="/delete" {
                                input type="hidden" name="delete" value=(joke.id.0);
                                button type="submit" { "Delete" }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn update_page(current_user: &User, joke: &Joke) -> Markup {
    layout(
        "Edit joke",
        Some(current_user),
        html! {
            h1 { "Edit joke" }
            form method="post" action="/update" {
                input type="hidden" name="update" value=(joke.id.0);
                textarea name="text" rows="4" required { (joke.text) }
                button type="submit" { "Save" }
            }
            p { a href="/edit" { "Back to my jokes" } }
        },
    )
}

pub fn contact_page(current_user: Option<&User>, sent: bool, error: Option<&str>) -> Markup {
    layout(
        "Contact",
        current_user,
        html! {
            h1 { "Contact us" }
            @if sent {
                p.success { "Thanks! Your message has been sent." }
            }
            @if let Some(error) = error {
                p.error { (error) }
            }
            form method="post" action="/contact" {
                label { "Your email"
                    input type="email" name="email" required;
                }
                label { "Message"
                    textarea name="message" rows="6" placeholder="At least 10 characters" required { }
                }
                button type="submit" { "Send" }
            }
        },
    )
}

pub fn terms_page(current_user: Option<&User>) -> Markup {
    layout(
        "Terms of use",
        current_user,
        html! {
            h1 { "Terms of use" }
            p {
                "Jokeboard is a place for sharing jokes. Post only text you have "
                "the right to share, and keep it friendly."
            }
            p {
                "Jokes you post are visible to everyone. You can edit or delete "
                "your own jokes at any time from the My jokes page."
            }
            p {
                "Readers can flag a joke as inappropriate. Flagged jokes may be "
                "removed without notice."
            }
        },
    )
}

pub fn success_page(current_user: Option<&User>) -> Markup {
    layout(
        "Signed up",
        current_user,
        html! {
            h1 { "You're on the list" }
            p { "Thanks for signing up. New jokes will land in your inbox." }
            p { a href="/" { "Back to the jokes" } }
        },
    )
}

pub fn failure_page(current_user: Option<&User>) -> Markup {
    layout(
        "Signup failed",
        current_user,
        html! {
            h1 { "Signup failed" }
            p { "We couldn't add you to the list. Please try again in a moment." }
            p { a href="/" { "Back to the jokes" } }
        },
    )
}

pub fn not_found_page() -> Markup {
    layout(
        "Not found",
        None,
        html! {
            h1 { "Not found" }
            p { "That joke doesn't exist, or it isn't yours to change." }
            p { a href="/" { "Back to the jokes" } }
        },
    )
}

pub fn error_page() -> Markup {
    layout(
        "Something went wrong",
        None,
        html! {
            h1 { "Something went wrong" }
            p { "An unexpected error occurred. Please try again." }
            p { a href="/" { "Back to the jokes" } }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JokeId, UserId};
    use chrono::Utc;

    fn test_user(email: &str) -> User {
        User {
            id: UserId(1),
            email: Some(email.to_string()),
            password_hash: Some("hash".to_string()),
            google_id: None,
            facebook_id: None,
            created_at: Utc::now(),
        }
    }

    fn test_joke(text: &str) -> Joke {
        Joke {
            id: JokeId("joke-1".to_string()),
            text: text.to_string(),
            liked: false,
            flagged: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_home_page_renders_feed() {
        let feed = vec![FeedEntry {
            user: test_user("alice@example.com"),
            jokes: vec![test_joke("Why did the chicken cross the road?")],
        }];
        let page = home_page(None, &feed).into_string();
        assert!(page.contains("Jokes by alice"));
        assert!(page.contains("Why did the chicken cross the road?"));
        // Logged out, so no toggle buttons
        assert!(!page.contains("/favourites"));
    }

    #[test]
    fn test_home_page_escapes_joke_text() {
        let feed = vec![FeedEntry {
            user: test_user("alice@example.com"),
            jokes: vec![test_joke("<script>alert('xss')</script>")],
        }];
        let page = home_page(None, &feed).into_string();
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_register_page_shows_error() {
        let page = register_page(Some("Passwords do not match.")).into_string();
        assert!(page.contains("Passwords do not match."));
    }

    #[test]
    fn test_random_page_embeds_joke_pool() {
        let feed = vec![FeedEntry {
            user: test_user("bob@example.com"),
            jokes: vec![test_joke("first"), test_joke("second")],
        }];
        let page = random_page(None, &feed).into_string();
        assert!(page.contains("joke-pool"));
        assert!(page.contains("first"));
        assert!(page.contains("second"));
    }

    #[test]
    fn test_edit_page_carries_joke_ids() {
        let user = test_user("alice@example.com");
        let jokes = vec![test_joke("mine")];
        let page = edit_page(&user, &jokes).into_string();
        assert!(page.contains("name=\"update\" value=\"joke-1\""));
        assert!(page.contains("name=\"delete\" value=\"joke-1\""));
    }
}
