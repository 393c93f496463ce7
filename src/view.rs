//! Pure rendering of the task list into a small element tree.
//!
//! User text only ever enters markup through [`escape_html`], which runs when
//! the tree is serialised.

use crate::models::{Filter, Task, TaskId};
use chrono::{DateTime, NaiveDateTime};
use std::borrow::Cow;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    /// `None` marks a boolean attribute such as `checked`.
    pub attrs: Vec<(&'static str, Option<String>)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Element {
        Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Element {
        self.attrs.push((name, Some(value.into())));
        self
    }

    pub fn flag(mut self, name: &'static str) -> Element {
        self.attrs.push((name, None));
        self
    }

    pub fn class(self, class: impl Into<String>) -> Element {
        self.attr("class", class)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Element {
        self.children.push(node.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Element {
        self.child(Node::Text(text.into()))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Node {
        Node::Element(element)
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "input" | "br" | "hr" | "img")
}

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Element(el) => {
                out.push('<');
                out.push_str(el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        out.push_str(&escape_html(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void(el.tag) {
                    return;
                }
                for child in &el.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(el.tag);
                out.push('>');
            }
        }
    }
}

// Read-side queries over the tree, used by assertions.
#[cfg(test)]
impl Element {
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map_or(false, |classes| classes.split_whitespace().any(|c| c == class))
    }
}

#[cfg(test)]
impl Node {
    /// Concatenated text of this node and its descendants, unescaped.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(el) => el.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Depth-first search for elements carrying `class`.
    pub fn find_by_class<'a>(&'a self, class: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_by_class(class, &mut found);
        found
    }

    fn collect_by_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        if let Node::Element(el) = self {
            if el.has_class(class) {
                found.push(el);
            }
            for child in &el.children {
                child.collect_by_class(class, found);
            }
        }
    }
}

pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// View model of one task, ready for either the HTML tree or the terminal list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskCard {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub date: String,
}

impl TaskCard {
    pub fn from_task(task: &Task) -> TaskCard {
        TaskCard {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            date: format_date(&task.created_at),
        }
    }

    pub fn to_node(&self) -> Node {
        let mut checkbox = Element::new("input")
            .attr("type", "checkbox")
            .class("todo-checkbox");
        if self.completed {
            checkbox = checkbox.flag("checked");
        }

        let mut content = Element::new("div")
            .class("todo-content")
            .child(Element::new("h3").class("todo-title").text(self.title.as_str()));
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            content = content.child(
                Element::new("p")
                    .class("todo-description")
                    .text(description),
            );
        }
        content = content.child(Element::new("span").class("todo-date").text(self.date.as_str()));

        let class = if self.completed {
            "todo-item completed"
        } else {
            "todo-item"
        };
        Element::new("div")
            .class(class)
            .attr("data-id", self.id.to_string())
            .child(checkbox)
            .child(content)
            .child(Element::new("button").class("delete-btn").text("Delete"))
            .into()
    }
}

pub fn visible_cards(tasks: &[Task], filter: Filter) -> Vec<TaskCard> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .map(TaskCard::from_task)
        .collect()
}

pub fn empty_message(filter: Filter) -> &'static str {
    match filter {
        Filter::All => "No tasks yet. Add one to get started.",
        Filter::Completed => "No completed tasks.",
        Filter::Pending => "No pending tasks.",
    }
}

pub fn render(tasks: &[Task], filter: Filter) -> Node {
    let cards = visible_cards(tasks, filter);
    if cards.is_empty() {
        return Element::new("div")
            .class("empty-state")
            .child(Element::new("p").text(empty_message(filter)))
            .into();
    }

    cards
        .iter()
        .fold(
            Element::new("div").attr("id", "todoList").class("todo-list"),
            |list, card| list.child(card.to_node()),
        )
        .into()
}

/// Backend timestamps are `%Y-%m-%d %H:%M:%S`; RFC 3339 is accepted too.
pub fn format_date(created_at: &str) -> String {
    if let Ok(naive) = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S") {
        return naive.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(created_at) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    created_at.to_string()
}
