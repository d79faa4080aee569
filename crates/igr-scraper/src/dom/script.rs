//! JavaScript snippets evaluated by [`super::ChromePage`].
//!
//! Every snippet runs from the top-level document, enumerates the same-origin
//! documents reachable through `frame`/`iframe` elements and addresses one of
//! them by position. Arguments are substituted as JSON literals.

use super::FrameRef;

const PRELUDE: &str = r#"
const __docs = (() => {
  const out = [];
  const walk = (d) => {
    out.push(d);
    for (const f of d.querySelectorAll('iframe, frame')) {
      let inner = null;
      try { inner = f.contentDocument; } catch (e) { inner = null; }
      if (inner) walk(inner);
    }
  };
  walk(document);
  return out;
})();
const __norm = (s) => (s || '').replace(/[​‌‍⁠﻿]/g, '').replace(/\s+/g, ' ').trim();
const __text = (el) => __norm(el.tagName === 'INPUT' ? el.value : (el.innerText || el.textContent));
const __fire = (el, names) => { for (const n of names) el.dispatchEvent(new Event(n, { bubbles: true })); };
const __options = (el) => Array.from(el.options || []).map((o) => ({ value: o.value, text: __norm(o.text) }));
const __textInputs = (doc) => Array.from(doc.querySelectorAll('input')).filter((i) => {
  const t = (i.getAttribute('type') || 'text').toLowerCase();
  return t === 'text' || t === 'search';
});
"#;

const EXISTS: &str = "return !!doc.querySelector(__SEL__);";

const INNER_HTML: &str = "const el = doc.querySelector(__SEL__); return el ? el.innerHTML : null;";

const SELECT_OPTIONS: &str = "const el = doc.querySelector(__SEL__); return el ? __options(el) : [];";

const SELECT_VALUE: &str = r#"
const el = __TARGET__;
if (!el || !el.options) return false;
const opt = Array.from(el.options).find((o) => o.value === __VALUE__);
if (!opt) return false;
el.value = opt.value;
__fire(el, ['input', 'change']);
return true;
"#;

const ALL_SELECTS: &str =
    "return Array.from(doc.querySelectorAll('select')).map((el) => __options(el));";

const CLICK_TEXT: &str = r#"
const want = __norm(__TEXT__).toLowerCase();
if (!want || !doc.body) return false;
const skip = new Set(['SCRIPT', 'STYLE', 'OPTION', 'SELECT', 'HEAD', 'TITLE']);
const hit = (el) => {
  const t = __text(el).toLowerCase();
  return __EXACT__ ? t === want : t.includes(want);
};
const matches = Array.from(doc.body.querySelectorAll('*')).filter((el) => !skip.has(el.tagName) && hit(el));
const leaf = matches.find((el) => !matches.some((o) => o !== el && el.contains(o)));
if (!leaf) return false;
leaf.click();
return true;
"#;

const CLICK_MATCHING: &str = r#"
const want = __norm(__TEXT__).toLowerCase();
const found = Array.from(doc.querySelectorAll(__SEL__)).filter((e) => __text(e).toLowerCase() === want);
const el = __LAST__ ? found[found.length - 1] : found[0];
if (!el) return false;
el.click();
return true;
"#;

const CHECK_RADIO_NEAR_TEXT: &str = r#"
const want = __norm(__TEXT__).toLowerCase();
if (!want) return false;
const has = (el) => !!el && __text(el).toLowerCase().includes(want);
let radio = null;
for (const label of doc.querySelectorAll('label')) {
  if (!has(label)) continue;
  if (label.htmlFor) radio = doc.getElementById(label.htmlFor);
  if (!radio) radio = label.querySelector('input[type=radio]');
  if (!radio) {
    const prev = label.previousElementSibling;
    if (prev && prev.matches('input[type=radio]')) radio = prev;
  }
  if (radio) break;
}
if (!radio) {
  radio = Array.from(doc.querySelectorAll('input[type=radio]'))
    .find((r) => has(r.closest('td, li, span, div')));
}
if (!radio) return false;
radio.checked = true;
__fire(radio, ['change', 'click']);
return true;
"#;

const RADIOS: &str = r#"
return Array.from(doc.querySelectorAll('input[type=radio]')).map((r, index) => {
  const byFor = r.id ? doc.querySelector('label[for="' + CSS.escape(r.id) + '"]') : null;
  let next = r.nextElementSibling;
  while (next && next.tagName !== 'LABEL' && next.tagName !== 'INPUT') next = next.nextElementSibling;
  const box = r.closest('td, tr, span, div') || r.parentElement;
  return {
    index,
    id: r.id || '',
    label_for: byFor ? __text(byFor) : '',
    next_label: next && next.tagName === 'LABEL' ? __text(next) : '',
    container: box ? __text(box) : '',
  };
});
"#;

const CHECK_RADIO: &str = r#"
const r = doc.querySelectorAll('input[type=radio]')[__INDEX__];
if (!r) return false;
r.checked = true;
__fire(r, ['change', 'click']);
return true;
"#;

const TEXT_INPUTS: &str = r#"
const all = Array.from(doc.querySelectorAll('label, input, button'));
const isButton = (b) => {
  const t = (b.getAttribute('type') || '').toLowerCase();
  return b.tagName === 'BUTTON' || t === 'submit' || t === 'button';
};
return __textInputs(doc).map((i, index) => {
  const pos = all.indexOf(i);
  let label = '';
  for (let k = pos - 1; k >= 0; k--) {
    if (all[k].tagName === 'LABEL') { label = __text(all[k]); break; }
  }
  if (i.id) {
    const l = doc.querySelector('label[for="' + CSS.escape(i.id) + '"]');
    if (l) label = __text(l);
  }
  let next_button = '';
  for (let k = pos + 1; k < all.length; k++) {
    if (isButton(all[k])) { next_button = __text(all[k]); break; }
  }
  return {
    index,
    id: i.id || '',
    name: i.name || '',
    aria_label: i.getAttribute('aria-label') || '',
    placeholder: i.getAttribute('placeholder') || '',
    label,
    next_button,
  };
});
"#;

const FILL_INPUT: &str = r#"
const i = __textInputs(doc)[__INDEX__];
if (!i) return false;
i.focus();
i.value = __VALUE__;
__fire(i, ['input', 'change']);
return true;
"#;

const CLICK_ROW_LINK: &str = r#"
const t = doc.querySelector(__SEL__);
if (!t) return false;
const row = t.querySelectorAll('tr')[__INDEX__];
const a = row ? row.querySelector('td a') : null;
if (!a) return false;
a.click();
return true;
"#;

const VALUE_OF: &str = r#"
const el = doc.querySelector(__SEL__);
if (!el) return null;
return typeof el.value === 'string' ? el.value : (el.textContent || '');
"#;

/// A JSON string literal, which is also a valid JavaScript literal.
fn lit(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

fn in_frame(frame: FrameRef, fallback: &str, body: &str) -> String {
    format!(
        "(() => {{ {PRELUDE}\nconst doc = __docs[{}];\nif (!doc) return {fallback};\n{body}\n}})()",
        frame.0
    )
}

pub(super) fn frame_count() -> String {
    format!("(() => {{ {PRELUDE}\nreturn __docs.length;\n}})()")
}

pub(super) fn exists(frame: FrameRef, selector: &str) -> String {
    in_frame(frame, "false", &EXISTS.replace("__SEL__", &lit(selector)))
}

pub(super) fn inner_html(frame: FrameRef, selector: &str) -> String {
    in_frame(frame, "null", &INNER_HTML.replace("__SEL__", &lit(selector)))
}

pub(super) fn select_options(frame: FrameRef, selector: &str) -> String {
    in_frame(frame, "[]", &SELECT_OPTIONS.replace("__SEL__", &lit(selector)))
}

pub(super) fn select_value(frame: FrameRef, selector: &str, value: &str) -> String {
    let target = format!("doc.querySelector({})", lit(selector));
    in_frame(
        frame,
        "false",
        &SELECT_VALUE
            .replace("__TARGET__", &target)
            .replace("__VALUE__", &lit(value)),
    )
}

pub(super) fn all_selects(frame: FrameRef) -> String {
    in_frame(frame, "[]", ALL_SELECTS)
}

pub(super) fn select_nth(frame: FrameRef, index: usize, value: &str) -> String {
    let target = format!("doc.querySelectorAll('select')[{index}]");
    in_frame(
        frame,
        "false",
        &SELECT_VALUE
            .replace("__TARGET__", &target)
            .replace("__VALUE__", &lit(value)),
    )
}

pub(super) fn click_text(frame: FrameRef, text: &str, exact: bool) -> String {
    in_frame(
        frame,
        "false",
        &CLICK_TEXT
            .replace("__TEXT__", &lit(text))
            .replace("__EXACT__", if exact { "true" } else { "false" }),
    )
}

pub(super) fn click_matching(frame: FrameRef, selector: &str, text: &str, last: bool) -> String {
    in_frame(
        frame,
        "false",
        &CLICK_MATCHING
            .replace("__SEL__", &lit(selector))
            .replace("__TEXT__", &lit(text))
            .replace("__LAST__", if last { "true" } else { "false" }),
    )
}

pub(super) fn check_radio_near_text(frame: FrameRef, text: &str) -> String {
    in_frame(
        frame,
        "false",
        &CHECK_RADIO_NEAR_TEXT.replace("__TEXT__", &lit(text)),
    )
}

pub(super) fn radios(frame: FrameRef) -> String {
    in_frame(frame, "[]", RADIOS)
}

pub(super) fn check_radio(frame: FrameRef, index: usize) -> String {
    in_frame(
        frame,
        "false",
        &CHECK_RADIO.replace("__INDEX__", &index.to_string()),
    )
}

pub(super) fn text_inputs(frame: FrameRef) -> String {
    in_frame(frame, "[]", TEXT_INPUTS)
}

pub(super) fn fill_input(frame: FrameRef, index: usize, value: &str) -> String {
    in_frame(
        frame,
        "false",
        &FILL_INPUT
            .replace("__INDEX__", &index.to_string())
            .replace("__VALUE__", &lit(value)),
    )
}

pub(super) fn click_row_link(frame: FrameRef, selector: &str, row_index: usize) -> String {
    in_frame(
        frame,
        "false",
        &CLICK_ROW_LINK
            .replace("__SEL__", &lit(selector))
            .replace("__INDEX__", &row_index.to_string()),
    )
}

pub(super) fn value_of(frame: FrameRef, selector: &str) -> String {
    in_frame(frame, "null", &VALUE_OF.replace("__SEL__", &lit(selector)))
}
