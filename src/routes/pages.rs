/// Standalone HTML pages rendered for the one-click email callbacks. The
/// audience is an external email recipient, so these always carry a plain
/// status message and never raw error details.
pub fn response_page(
    title: &str,
    icon: &str,
    color: &str,
    message: &str,
    extra_html: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            margin: 0;
            background-color: #f3f4f6;
        }}
        .container {{
            background: white;
            padding: 40px;
            border-radius: 10px;
            box-shadow: 0 4px 6px rgba(0,0,0,0.1);
            text-align: center;
            max-width: 600px;
        }}
        .icon {{
            font-size: 64px;
            margin-bottom: 20px;
        }}
        h1 {{
            color: {color};
            margin-bottom: 20px;
        }}
        p {{
            color: #374151;
            line-height: 1.6;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="icon">{icon}</div>
        <h1>{title}</h1>
        <p>{message}</p>
        {extra_html}
    </div>
</body>
</html>"#
    )
}

pub fn meet_link_block(join_link: &str) -> String {
    format!(
        r#"<div style="margin-top: 20px; padding: 20px; background-color: #e8f5e9; border-radius: 8px; border-left: 4px solid #4caf50;">
    <p style="color: #2e7d32; font-weight: bold;">Meeting link:</p>
    <a href="{join_link}" style="color: #4caf50; text-decoration: none; word-break: break-all;">{join_link}</a>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_carries_title_message_and_extra() {
        let page = response_page(
            "Interview Confirmed",
            "OK",
            "#28a745",
            "See you soon.",
            &meet_link_block("https://meet.example.com/abc"),
        );
        assert!(page.contains("<title>Interview Confirmed</title>"));
        assert!(page.contains("See you soon."));
        assert!(page.contains("https://meet.example.com/abc"));
        assert!(page.contains("color: #28a745"));
    }
}
