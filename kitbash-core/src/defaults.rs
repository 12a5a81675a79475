//! Built-in catalog contents: the categories and snippets a fresh store
//! starts with, and the factory copies `reset` restores. Snippet ids here
//! are stable slugs; user-created snippets get UUIDs instead.

use chrono::Utc;

use crate::snippet::{Category, FragmentSet, Snippet};

fn category(id: &str, name: &str, icon: &str, description: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        description: Some(description.to_string()),
    }
}

fn snippet(
    id: &str,
    title: &str,
    category: &str,
    description: &str,
    markup: &str,
    style: &str,
    script: &str,
) -> Snippet {
    let now = Utc::now();
    Snippet {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        description: Some(description.to_string()),
        fragments: FragmentSet::new(markup, style, script),
        created_at: now,
        updated_at: now,
    }
}

pub fn categories() -> Vec<Category> {
    vec![
        category(
            "buttons",
            "Buttons",
            "mouse-pointer",
            "Interactive button components for your applications",
        ),
        category(
            "headings",
            "Headings",
            "heading",
            "Typography components for headers and titles",
        ),
        category("forms", "Forms", "form-input", "Input fields and form components"),
        category(
            "sliders",
            "Sliders",
            "sliders-horizontal",
            "Range and slider input components",
        ),
        category("carousels", "Carousels", "images", "Image and content carousel components"),
        category("animations", "Animations", "zap", "Motion and transition snippets"),
        category("icons", "Icons", "star", "Icon components and collections"),
    ]
}

pub fn snippets() -> Vec<Snippet> {
    vec![
        snippet(
            "btn-primary",
            "Primary Button",
            "buttons",
            "A beautiful gradient button with hover effects",
            r#"<button class="btn btn-primary">Click Me</button>"#,
            r#".btn {
  padding: 12px 24px;
  border: none;
  border-radius: 8px;
  font-weight: 500;
  cursor: pointer;
  transition: all 0.2s ease;
  font-family: inherit;
}

.btn-primary {
  background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
  color: white;
  box-shadow: 0 4px 15px rgba(102, 126, 234, 0.3);
}

.btn-primary:hover {
  transform: translateY(-2px);
  box-shadow: 0 6px 20px rgba(102, 126, 234, 0.4);
}"#,
            r#"container.on('.btn-primary', 'click', function()
  print('Primary button clicked!')
end)"#,
        ),
        snippet(
            "btn-outline",
            "Outline Button",
            "buttons",
            "Modern outline button with smooth hover transition",
            r#"<button class="btn btn-outline">Get Started</button>"#,
            r#".btn {
  padding: 12px 24px;
  border-radius: 8px;
  font-weight: 500;
  cursor: pointer;
  transition: all 0.2s ease;
  font-family: inherit;
}

.btn-outline {
  background: transparent;
  border: 2px solid #8b5cf6;
  color: #8b5cf6;
}

.btn-outline:hover {
  background: #8b5cf6;
  color: white;
  transform: translateY(-1px);
}"#,
            r#"container.on('.btn-outline', 'click', function()
  container.set_style('.btn-outline', 'transform: scale(0.95)')
  container.defer(100, function()
    container.set_style('.btn-outline', 'transform: translateY(-1px)')
  end)
end)"#,
        ),
        snippet(
            "btn-icon",
            "Icon Button",
            "buttons",
            "Circular icon button with scaling animation",
            r#"<button class="btn btn-icon"><i class="fas fa-heart"></i></button>"#,
            r#".btn-icon {
  width: 48px;
  height: 48px;
  border: none;
  border-radius: 50%;
  background: linear-gradient(135deg, #10b981 0%, #059669 100%);
  color: white;
  cursor: pointer;
  transition: all 0.2s ease;
  display: flex;
  align-items: center;
  justify-content: center;
  box-shadow: 0 4px 15px rgba(16, 185, 129, 0.3);
}

.btn-icon:hover {
  transform: scale(1.1);
  box-shadow: 0 6px 20px rgba(16, 185, 129, 0.4);
}"#,
            r#"container.on('.btn-icon', 'click', function()
  container.toggle_class('.btn-icon i', 'fas')
  container.toggle_class('.btn-icon i', 'far')
end)"#,
        ),
        snippet(
            "btn-loading",
            "Loading Button",
            "buttons",
            "Button with animated loading spinner",
            r#"<button class="btn btn-loading"><div class="spinner"></div><span>Loading...</span></button>"#,
            r#".btn {
  padding: 12px 24px;
  border: none;
  border-radius: 8px;
  font-weight: 500;
  cursor: pointer;
  transition: all 0.2s ease;
  font-family: inherit;
}

.btn-loading {
  background: #6366f1;
  color: white;
  display: flex;
  align-items: center;
  gap: 8px;
}

.spinner {
  width: 16px;
  height: 16px;
  border: 2px solid rgba(255, 255, 255, 0.3);
  border-top: 2px solid white;
  border-radius: 50%;
  animation: spin 1s linear infinite;
}

@keyframes spin {
  to { transform: rotate(360deg); }
}"#,
            r#"container.on('.btn-loading', 'click', function()
  if container.has_class('.btn-loading', 'loading') then
    container.remove_class('.btn-loading', 'loading')
    container.set_markup('.btn-loading', 'Submit')
  else
    container.add_class('.btn-loading', 'loading')
    container.set_markup('.btn-loading', '<div class="spinner"></div><span>Loading...</span>')
  end
end)"#,
        ),
        snippet(
            "btn-toggle",
            "Toggle Switch",
            "buttons",
            "Modern toggle switch with smooth animation",
            r#"<div class="toggle-wrapper"><span>Off</span><div class="toggle"><div class="toggle-slider"></div></div><span class="toggle-on">On</span></div>"#,
            r#".toggle-wrapper {
  display: flex;
  align-items: center;
  gap: 12px;
  font-size: 14px;
  color: #6b7280;
}

.toggle {
  width: 48px;
  height: 24px;
  background: #374151;
  border-radius: 12px;
  position: relative;
  cursor: pointer;
  transition: background 0.3s ease;
}

.toggle.active {
  background: #ff6b35;
}

.toggle-slider {
  width: 20px;
  height: 20px;
  background: white;
  border-radius: 50%;
  position: absolute;
  top: 2px;
  left: 2px;
  transition: transform 0.3s ease;
  box-shadow: 0 2px 4px rgba(0, 0, 0, 0.2);
}

.toggle.active .toggle-slider {
  transform: translateX(24px);
}

.toggle-on {
  color: #ff6b35;
  font-weight: 500;
}"#,
            r#"container.on('.toggle', 'click', function()
  local active = container.toggle_class('.toggle', 'active')
  if active then
    container.set_style('.toggle-wrapper span', 'color: #6b7280')
    container.set_style('.toggle-on', 'color: #ff6b35')
  else
    container.set_style('.toggle-wrapper span', 'color: #374151')
    container.set_style('.toggle-on', 'color: #6b7280')
  end
end)"#,
        ),
        snippet(
            "btn-group",
            "Button Group",
            "buttons",
            "Segmented button group with active state",
            r#"<div class="btn-group"><button id="seg-day" class="btn-segment active">Day</button><button id="seg-week" class="btn-segment">Week</button><button id="seg-month" class="btn-segment">Month</button></div>"#,
            r#".btn-group {
  display: inline-flex;
  border-radius: 8px;
  border: 1px solid #374151;
  background: #1f2937;
  padding: 4px;
}

.btn-segment {
  padding: 8px 16px;
  border: none;
  background: transparent;
  color: #9ca3af;
  font-size: 14px;
  font-weight: 500;
  cursor: pointer;
  transition: all 0.2s ease;
  border-radius: 4px;
}

.btn-segment.active {
  background: #ff6b35;
  color: white;
}

.btn-segment:hover:not(.active) {
  color: white;
  background: rgba(255, 255, 255, 0.1);
}"#,
            r#"container.on('.btn-segment', 'click', function(e)
  container.remove_class('.btn-segment', 'active')
  container.add_class(e.target, 'active')
end)"#,
        ),
        snippet(
            "heading-gradient",
            "Gradient Heading",
            "headings",
            "Eye-catching gradient text heading",
            r#"<h1 class="gradient-heading">Kitbash Library</h1>"#,
            r#".gradient-heading {
  font-size: 3rem;
  font-weight: 800;
  background: linear-gradient(135deg, #ff6b35 0%, #f7931e 100%);
  -webkit-background-clip: text;
  -webkit-text-fill-color: transparent;
  background-clip: text;
  text-align: center;
  margin: 0;
  padding: 20px 0;
}"#,
            "",
        ),
        snippet(
            "heading-animated",
            "Animated Heading",
            "headings",
            "Heading with typing animation effect",
            r#"<h2 class="animated-heading"><span class="typing-text">Welcome to Kitbash</span><span class="cursor">|</span></h2>"#,
            r#".animated-heading {
  font-size: 2.5rem;
  font-weight: 600;
  color: #fff;
  text-align: center;
  margin: 0;
  padding: 20px 0;
}

.typing-text {
  overflow: hidden;
  border-right: 3px solid #ff6b35;
  white-space: nowrap;
  animation: typing 3s steps(20, end), blink-caret 0.75s step-end infinite;
}

.cursor {
  animation: blink 1s infinite;
  color: #ff6b35;
}

@keyframes typing {
  from { width: 0 }
  to { width: 100% }
}

@keyframes blink {
  0%, 50% { opacity: 1 }
  51%, 100% { opacity: 0 }
}"#,
            "",
        ),
        snippet(
            "form-modern-input",
            "Modern Input Field",
            "forms",
            "Floating label input field with modern styling",
            r#"<div class="input-group"><input type="text" class="modern-input" id="email" required><label for="email" class="input-label">Email Address</label></div>"#,
            r#".input-group {
  position: relative;
  margin: 20px 0;
}

.modern-input {
  width: 100%;
  padding: 15px 10px 5px;
  font-size: 16px;
  border: 2px solid #374151;
  border-radius: 8px;
  background: transparent;
  color: #fff;
  transition: all 0.3s ease;
}

.modern-input:focus {
  outline: none;
  border-color: #ff6b35;
  box-shadow: 0 0 0 3px rgba(255, 107, 53, 0.1);
}

.input-label {
  position: absolute;
  left: 10px;
  top: 15px;
  font-size: 16px;
  color: #9ca3af;
  pointer-events: none;
  transition: all 0.3s ease;
}

.modern-input:focus + .input-label,
.modern-input:valid + .input-label {
  top: 5px;
  font-size: 12px;
  color: #ff6b35;
}"#,
            "",
        ),
        snippet(
            "slider-range",
            "Custom Range Slider",
            "sliders",
            "Stylized range slider with custom styling",
            r#"<div class="slider-container"><label class="slider-label">Volume: <span id="slider-value">50</span>%</label><input type="range" class="custom-slider" min="0" max="100" value="50" id="volumeSlider"></div>"#,
            r#".slider-container {
  padding: 20px;
  text-align: center;
}

.slider-label {
  display: block;
  margin-bottom: 15px;
  color: #fff;
  font-weight: 500;
}

.custom-slider {
  -webkit-appearance: none;
  width: 100%;
  height: 8px;
  border-radius: 4px;
  background: #374151;
  outline: none;
  opacity: 0.7;
  transition: opacity 0.2s;
}

.custom-slider:hover {
  opacity: 1;
}

.custom-slider::-webkit-slider-thumb {
  -webkit-appearance: none;
  appearance: none;
  width: 20px;
  height: 20px;
  border-radius: 50%;
  background: #ff6b35;
  cursor: pointer;
  box-shadow: 0 2px 6px rgba(255, 107, 53, 0.3);
}

.custom-slider::-moz-range-thumb {
  width: 20px;
  height: 20px;
  border-radius: 50%;
  background: #ff6b35;
  cursor: pointer;
  border: none;
  box-shadow: 0 2px 6px rgba(255, 107, 53, 0.3);
}"#,
            r#"container.on('#volumeSlider', 'input', function(e)
  container.set_text('#slider-value', e.value)
  local pct = tonumber(e.value) or 0
  container.set_style('#volumeSlider', 'background: linear-gradient(to right, #ff6b35 0%, #ff6b35 ' .. pct .. '%, #374151 ' .. pct .. '%, #374151 100%)')
end)"#,
        ),
    ]
}
