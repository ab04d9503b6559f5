//! Layouts used when the site's `templates/` does not define them.

pub const PAGE: &str = r#"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ page.title }} | {{ site.title }}</title>
</head>
<body>
  <main>
    <article>
      <h1>{{ page.title }}</h1>
      {% if page.date %}<time datetime="{{ page.date }}">{{ page.date | date("%B %d, %Y") }}</time>{% endif %}
      {{ content | safe }}
      {% if page.tags %}<ul class="tags">{% for tag in page.tags %}<li>{{ tag }}</li>{% endfor %}</ul>{% endif %}
    </article>
  </main>
</body>
</html>
"#;

pub const TAG: &str = r#"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
  <meta charset="utf-8">
  <title>{{ page.title }} | {{ site.title }}</title>
</head>
<body>
  <main>
    <h1>Tagged “{{ page.tag.name }}”</h1>
    <ul>
      {% for post in page.posts %}<li><a href="{{ post.url }}">{{ post.title }}</a>{% if post.date %} <time datetime="{{ post.date }}">{{ post.date }}</time>{% endif %}</li>
      {% endfor %}
    </ul>
  </main>
</body>
</html>
"#;

pub const TAGS: &str = r#"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
  <meta charset="utf-8">
  <title>{{ page.title }} | {{ site.title }}</title>
</head>
<body>
  <main>
    <h1>{{ page.title }}</h1>
    <ul>
      {% for tag in page.tags %}<li><a href="{{ tag.url }}">{{ tag.name }}</a> ({{ tag.count }})</li>
      {% endfor %}
    </ul>
  </main>
</body>
</html>
"#;

/// `(name, source)` of every built-in layout.
pub const ALL: &[(&str, &str)] = &[("page", PAGE), ("tag", TAG), ("tags", TAGS)];
