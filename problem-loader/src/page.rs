//! Extraction of problem data from the site's markup.
//!
//! Everything here is synchronous: the parsed document is not `Send`, so
//! it never lives across an await point.
use judge_apis::problem::{DisplayLanguage, ProblemLink, Sample};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Headings of sample sections, in both statement languages.
/// A Japanese statement may still use English headings and vice versa.
const SAMPLE_MARKERS: &[&str] = &["入力例", "出力例", "Sample Input", "Sample Output"];

/// Expected element was not found on the page.
#[derive(Debug, thiserror::Error)]
#[error("{0} not found")]
pub struct MissingElement(pub &'static str);

/// Problem data read from a task page
#[derive(Debug, Clone)]
pub struct ParsedProblem {
    pub title: String,
    pub execute_constraints: String,
    pub body_html: String,
    pub samples: Vec<Sample>,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("selector is valid")
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Query parameter asking the site to render `lang`.
pub fn select_language(lang: DisplayLanguage) -> (&'static str, &'static str) {
    ("lang", lang.code())
}

/// Subtree of the statement written in `lang`.
pub fn select_body(container: ElementRef<'_>, lang: DisplayLanguage) -> Option<ElementRef<'_>> {
    container
        .select(&selector(&format!("span.lang-{}", lang.code())))
        .next()
}

/// Text of the first node of the title, without the trailing links.
fn title_of(container: ElementRef) -> Option<String> {
    let heading = container.select(&selector("span.h2")).next()?;
    let first = heading.first_child()?;
    let text = match first.value().as_text() {
        Some(text) => text.trim().to_string(),
        None => ElementRef::wrap(first).map(text_of)?,
    };
    (!text.is_empty()).then_some(text)
}

/// Parses a task page rendered in `lang`.
pub fn parse_problem(html: &str, lang: DisplayLanguage) -> Result<ParsedProblem, MissingElement> {
    let document = Html::parse_document(html);
    let container = document
        .select(&selector("#main-container"))
        .next()
        .ok_or(MissingElement("main container"))?;

    let title = title_of(container).ok_or(MissingElement("title"))?;
    let execute_constraints = container
        .select(&selector("p"))
        .next()
        .map(text_of)
        .filter(|c| !c.is_empty())
        .ok_or(MissingElement("execution constraints"))?;
    let body = select_body(container, lang).ok_or(MissingElement("statement body"))?;

    Ok(ParsedProblem {
        title,
        execute_constraints,
        body_html: body.inner_html().trim().to_string(),
        samples: parse_samples(body),
    })
}

fn is_sample_heading(heading: &str) -> bool {
    SAMPLE_MARKERS.iter().any(|m| heading.contains(m))
}

/// Pairs sample sections of `body` two at a time: (input, output).
/// A trailing section without a partner is dropped.
pub fn parse_samples(body: ElementRef) -> Vec<Sample> {
    let heading = selector("h3");
    let pre = selector("pre");
    let sections: Vec<ElementRef> = body
        .select(&selector(".part"))
        .filter(|part| {
            part.select(&heading)
                .next()
                .map(|h| is_sample_heading(&h.text().collect::<String>()))
                .unwrap_or(false)
        })
        .collect();

    let first_pre = |section: ElementRef| {
        section.select(&pre).next().map(text_of).unwrap_or_default()
    };
    sections
        .chunks_exact(2)
        .map(|pair| Sample {
            input: first_pre(pair[0]),
            output: first_pre(pair[1]),
        })
        .collect()
}

/// Reads the contest task list. Rows without id, name or link are skipped.
pub fn parse_problem_links(html: &str, site: &Url) -> Vec<ProblemLink> {
    let document = Html::parse_document(html);
    let rows = selector("table.table-bordered tbody tr");
    let id_link = selector("td:nth-child(1) a");
    let name_link = selector("td:nth-child(2) a");
    let time_limit = selector("td:nth-child(3)");
    let memory_limit = selector("td:nth-child(4)");
    let submit_link = selector("td:nth-child(5) a");

    let resolve = |href: Option<&str>| -> Option<String> {
        let href = href?.trim();
        if href.is_empty() {
            return None;
        }
        site.join(href).ok().map(String::from)
    };

    document
        .select(&rows)
        .filter_map(|row| {
            let id = row.select(&id_link).next().map(text_of).unwrap_or_default();
            let name_el = row.select(&name_link).next()?;
            let name = text_of(name_el);
            let url = resolve(name_el.value().attr("href"))?;
            if id.is_empty() || name.is_empty() {
                return None;
            }
            Some(ProblemLink {
                id,
                name,
                url,
                time_limit: row.select(&time_limit).next().map(text_of).unwrap_or_default(),
                memory_limit: row
                    .select(&memory_limit)
                    .next()
                    .map(text_of)
                    .unwrap_or_default(),
                submit_url: row
                    .select(&submit_link)
                    .next()
                    .and_then(|a| resolve(a.value().attr("href")))
                    .unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Renders a task page in the site's layout.
    /// `sections` are (heading, content) pairs of the English statement.
    pub(crate) fn task_page(title: &str, sections: &[(&str, &str)]) -> String {
        let parts: String = sections
            .iter()
            .map(|(h, pre)| {
                format!(
                    r#"<div class="part"><section><h3>{}</h3><pre>{}</pre></section></div>"#,
                    h, pre
                )
            })
            .collect();
        format!(
            r#"<html><body>
            <div id="main-container" class="container">
              <span class="h2">{title}
                <a class="btn btn-default btn-sm" href="/contests/abc123/editorial">Editorial</a>
              </span>
              <hr/>
              <p>Time Limit: 2 sec / Memory Limit: 1024 MB</p>
              <div id="task-statement">
                <span class="lang">
                  <span class="lang-ja">
                    <div class="part"><section><h3>問題文</h3><p>二つの整数</p></section></div>
                    <div class="part"><section><h3>入力例 1</h3><pre>9 9</pre></section></div>
                    <div class="part"><section><h3>出力例 1</h3><pre>18</pre></section></div>
                  </span>
                  <span class="lang-en">
                    <div class="part"><section><h3>Problem Statement</h3><p>Two integers.</p></section></div>
                    {parts}
                  </span>
                </span>
              </div>
            </div>
            </body></html>"#
        )
    }

    pub(crate) fn task_list(rows: &[(&str, &str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(id, name, href)| {
                format!(
                    r#"<tr>
                      <td class="text-center no-break"><a href="{href}">{id}</a></td>
                      <td><a href="{href}">{name}</a></td>
                      <td class="text-right">2 sec</td>
                      <td class="text-right">1024 MB</td>
                      <td class="text-center"><a href="/contests/abc123/submit?taskScreenName=x">Submit</a></td>
                    </tr>"#
                )
            })
            .collect();
        format!(
            r#"<html><body><div id="main-container">
            <table class="table table-bordered table-striped">
              <thead><tr><th></th><th>Task Name</th><th>Time Limit</th><th>Memory Limit</th><th></th></tr></thead>
              <tbody>{rows}</tbody>
            </table></div></body></html>"#
        )
    }
}
